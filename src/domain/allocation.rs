//! Outcome of winner determination.

use serde::Serialize;

use super::availability::realized_availability;
use super::ids::{AgentId, GoodId};

/// One winning atom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Winner {
    /// Winning agent.
    pub agent: AgentId,
    /// Position of the agent's bid in the auction.
    pub bidder: usize,
    /// Position of the winning atom inside the agent's XOR bid.
    pub atom: usize,
    /// Goods awarded.
    pub bundle: Vec<GoodId>,
    /// Buyer value under the weighting used to allocate.
    pub value: f64,
    /// Seller cost under the weighting used to allocate.
    pub cost: f64,
    /// Realized availability of the bundle, once a sample is attached.
    pub realized_availability: Option<f64>,
}

impl Winner {
    /// Surplus `value - cost`.
    #[must_use]
    pub fn net(&self) -> f64 {
        self.value - self.cost
    }
}

/// Allocation chosen by the auctioneer.
///
/// Winners are ordered by bidder position. Payment vectors produced for this
/// allocation follow the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Allocation {
    winners: Vec<Winner>,
    sample: Option<Vec<f64>>,
}

impl Allocation {
    /// Allocation awarding nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from winners; they are sorted by bidder position.
    #[must_use]
    pub fn new(mut winners: Vec<Winner>) -> Self {
        winners.sort_by_key(|w| w.bidder);
        Self {
            winners,
            sample: None,
        }
    }

    /// Attach a per-good availability sample and record each winner's
    /// realized availability.
    #[must_use]
    pub fn realize(mut self, sample: Vec<f64>) -> Self {
        for winner in &mut self.winners {
            winner.realized_availability = Some(realized_availability(&winner.bundle, &sample));
        }
        self.sample = Some(sample);
        self
    }

    /// Winning atoms.
    #[must_use]
    pub fn winners(&self) -> &[Winner] {
        &self.winners
    }

    /// True when no atom was allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Number of winners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.winners.len()
    }

    /// Winning agents in allocation order.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentId> {
        self.winners.iter().map(|w| w.agent).collect()
    }

    /// Goods awarded to any winner, ascending.
    #[must_use]
    pub fn allocated_goods(&self) -> Vec<GoodId> {
        let mut goods: Vec<GoodId> = self
            .winners
            .iter()
            .flat_map(|w| w.bundle.iter().copied())
            .collect();
        goods.sort_unstable();
        goods.dedup();
        goods
    }

    /// Attached availability sample, if any.
    #[must_use]
    pub fn sample(&self) -> Option<&[f64]> {
        self.sample.as_deref()
    }

    /// Sum of buyer values.
    #[must_use]
    pub fn buyer_value(&self) -> f64 {
        self.winners.iter().map(|w| w.value).sum()
    }

    /// Sum of seller costs.
    #[must_use]
    pub fn seller_cost(&self) -> f64 {
        self.winners.iter().map(|w| w.cost).sum()
    }

    /// Total surplus.
    #[must_use]
    pub fn welfare(&self) -> f64 {
        self.buyer_value() - self.seller_cost()
    }
}
