//! A single auction instance: goods, seller costs and XOR bids.

use std::collections::HashSet;

use super::bid::{AtomicBid, XorBid};
use super::error::DomainError;
use super::ids::{AgentId, GoodId};

/// Immutable auction instance.
///
/// Goods are numbered `1..=goods`. Per-good vectors are indexed from zero,
/// so `costs[g - 1]` is the cost of good `g`.
#[derive(Debug, Clone, PartialEq)]
pub struct Auction {
    goods: usize,
    supply: Vec<u32>,
    costs: Vec<f64>,
    bids: Vec<XorBid>,
}

impl Auction {
    /// Create a validated auction with unit supply for every good.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when the cost vector length differs from
    /// `goods`, a cost is negative, a bid references a good outside the
    /// auction, or an agent bids twice.
    pub fn try_new(goods: usize, costs: Vec<f64>, bids: Vec<XorBid>) -> Result<Self, DomainError> {
        Self::with_supply(goods, vec![1; goods], costs, bids)
    }

    /// Create a validated auction with explicit per-good supply.
    ///
    /// # Errors
    ///
    /// Same as [`Auction::try_new`], plus a length check on `supply`.
    pub fn with_supply(
        goods: usize,
        supply: Vec<u32>,
        costs: Vec<f64>,
        bids: Vec<XorBid>,
    ) -> Result<Self, DomainError> {
        if supply.len() != goods {
            return Err(DomainError::LengthMismatch {
                field: "supply",
                expected: goods,
                actual: supply.len(),
            });
        }
        if costs.len() != goods {
            return Err(DomainError::LengthMismatch {
                field: "costs",
                expected: goods,
                actual: costs.len(),
            });
        }
        for (i, cost) in costs.iter().enumerate() {
            if !cost.is_finite() || *cost < 0.0 {
                return Err(DomainError::InvalidCost {
                    good: i + 1,
                    cost: *cost,
                });
            }
        }

        let mut seen = HashSet::with_capacity(bids.len());
        for bid in &bids {
            if !seen.insert(bid.agent()) {
                return Err(DomainError::DuplicateAgent { agent: bid.agent() });
            }
            for atom in bid.atoms() {
                if let Some(good) = atom.bundle().iter().find(|g| **g > goods) {
                    return Err(DomainError::GoodOutOfRange { good: *good, goods });
                }
            }
        }

        Ok(Self {
            goods,
            supply,
            costs,
            bids,
        })
    }

    /// Number of goods.
    #[must_use]
    pub const fn goods(&self) -> usize {
        self.goods
    }

    /// Per-good seller costs.
    #[must_use]
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    /// Cost of a single good.
    #[must_use]
    pub fn cost_of(&self, good: GoodId) -> f64 {
        self.costs.get(good - 1).copied().unwrap_or(0.0)
    }

    /// Units available of `good`.
    #[must_use]
    pub fn supply_of(&self, good: GoodId) -> u32 {
        self.supply.get(good - 1).copied().unwrap_or(0)
    }

    /// Submitted bids in agent order.
    #[must_use]
    pub fn bids(&self) -> &[XorBid] {
        &self.bids
    }

    /// Number of bidders.
    #[must_use]
    pub fn num_agents(&self) -> usize {
        self.bids.len()
    }

    /// Total number of atoms across all bids.
    #[must_use]
    pub fn num_atoms(&self) -> usize {
        self.bids.iter().map(XorBid::len).sum()
    }

    /// Atom `atom` of bidder `bidder` (both positional).
    #[must_use]
    pub fn atom(&self, bidder: usize, atom: usize) -> Option<&AtomicBid> {
        self.bids.get(bidder).and_then(|b| b.atom(atom))
    }

    /// Sub-auction with `agent`'s bid removed. Goods, supply and costs are kept.
    #[must_use]
    pub fn without_agent(&self, agent: AgentId) -> Self {
        Self {
            goods: self.goods,
            supply: self.supply.clone(),
            costs: self.costs.clone(),
            bids: self
                .bids
                .iter()
                .filter(|b| b.agent() != agent)
                .cloned()
                .collect(),
        }
    }
}
