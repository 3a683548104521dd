//! Closed-form winner determination for the LLG domain.
//!
//! Two local bidders each want one of two goods; a global bidder wants both.
//! Reduced instances with only some of the three bidders are accepted.

use crate::domain::{Allocation, Auction, Valuation, Winner};

/// Position of a bidder in the LLG domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlgRole {
    /// Wants good 1 only.
    Local1,
    /// Wants good 2 only.
    Local2,
    /// Wants goods 1 and 2.
    Global,
}

/// Bidder positions of an auction recognized as LLG-shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlgAuction {
    local1: Option<usize>,
    local2: Option<usize>,
    global: Option<usize>,
}

impl LlgAuction {
    /// Recognize the LLG shape: two unit-supply goods, at most three
    /// single-atom bids on `{1}`, `{2}` and `{1, 2}`, one per bundle.
    #[must_use]
    pub fn detect(auction: &Auction) -> Option<Self> {
        if auction.goods() != 2 || auction.supply_of(1) != 1 || auction.supply_of(2) != 1 {
            return None;
        }
        if auction.num_agents() == 0 {
            return None;
        }

        let mut shape = Self {
            local1: None,
            local2: None,
            global: None,
        };
        for (bidder, bid) in auction.bids().iter().enumerate() {
            let [atom] = bid.atoms() else {
                return None;
            };
            let slot = match atom.bundle() {
                [1] => &mut shape.local1,
                [2] => &mut shape.local2,
                [1, 2] => &mut shape.global,
                _ => return None,
            };
            if slot.replace(bidder).is_some() {
                return None;
            }
        }
        Some(shape)
    }

    /// Bidder position holding `role`, if present.
    #[must_use]
    pub const fn bidder(&self, role: LlgRole) -> Option<usize> {
        match role {
            LlgRole::Local1 => self.local1,
            LlgRole::Local2 => self.local2,
            LlgRole::Global => self.global,
        }
    }

    /// Role of the bidder at position `bidder`.
    #[must_use]
    pub fn role_of(&self, bidder: usize) -> Option<LlgRole> {
        [LlgRole::Local1, LlgRole::Local2, LlgRole::Global]
            .into_iter()
            .find(|role| self.bidder(*role) == Some(bidder))
    }

    /// Weighted surplus of the bidder in `role`, `None` when absent.
    #[must_use]
    pub fn surplus(&self, valuation: &Valuation<'_>, role: LlgRole) -> Option<f64> {
        let bidder = self.bidder(role)?;
        let atom = valuation.auction().atom(bidder, 0)?;
        Some(valuation.net(atom))
    }

    /// Welfare-maximizing allocation without a solver.
    ///
    /// Both locals win when each has non-negative surplus and together they
    /// match the global bidder; otherwise a single local that matches the
    /// global bidder; otherwise the global bidder when non-negative. Ties go
    /// to the locals.
    #[must_use]
    pub fn allocate(&self, valuation: &Valuation<'_>) -> Allocation {
        let s1 = self.surplus(valuation, LlgRole::Local1);
        let s2 = self.surplus(valuation, LlgRole::Local2);
        let global = self
            .surplus(valuation, LlgRole::Global)
            .unwrap_or(f64::NEG_INFINITY);

        let roles: &[LlgRole] = match (s1, s2) {
            (Some(a), Some(b)) if a >= 0.0 && b >= 0.0 && a + b >= global => {
                &[LlgRole::Local1, LlgRole::Local2]
            }
            (Some(a), _) if a >= 0.0 && a >= global => &[LlgRole::Local1],
            (_, Some(b)) if b >= 0.0 && b >= global => &[LlgRole::Local2],
            _ if global >= 0.0 => &[LlgRole::Global],
            _ => &[],
        };

        let winners = roles
            .iter()
            .filter_map(|role| self.winner(valuation, *role))
            .collect();
        Allocation::new(winners)
    }

    fn winner(&self, valuation: &Valuation<'_>, role: LlgRole) -> Option<Winner> {
        let bidder = self.bidder(role)?;
        let atom = valuation.auction().atom(bidder, 0)?;
        Some(Winner {
            agent: atom.agent(),
            bidder,
            atom: 0,
            bundle: atom.bundle().to_vec(),
            value: valuation.value(atom),
            cost: valuation.cost(atom),
            realized_availability: None,
        })
    }
}
