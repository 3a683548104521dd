//! XOR bids over bundles of goods.

use serde::Serialize;

use super::error::DomainError;
use super::ids::{AgentId, GoodId};

/// A single bundle-value pair of an XOR bid.
///
/// The bundle is stored sorted and without duplicates. Values are gross
/// valuations; seller costs live on the [`Auction`](super::Auction).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomicBid {
    agent: AgentId,
    bundle: Vec<GoodId>,
    value: f64,
}

impl AtomicBid {
    /// Create a validated atom.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyBundle`] for an empty bundle,
    /// [`DomainError::GoodOutOfRange`] when good 0 is requested and
    /// [`DomainError::InvalidValue`] for negative or non-finite values.
    pub fn try_new(agent: AgentId, bundle: Vec<GoodId>, value: f64) -> Result<Self, DomainError> {
        if bundle.is_empty() {
            return Err(DomainError::EmptyBundle { agent });
        }
        if bundle.contains(&0) {
            return Err(DomainError::GoodOutOfRange { good: 0, goods: 0 });
        }
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::InvalidValue { agent, value });
        }

        let mut bundle = bundle;
        bundle.sort_unstable();
        bundle.dedup();

        Ok(Self {
            agent,
            bundle,
            value,
        })
    }

    /// Bidder owning this atom.
    #[must_use]
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// Requested goods, sorted ascending.
    #[must_use]
    pub fn bundle(&self) -> &[GoodId] {
        &self.bundle
    }

    /// Gross value of the bundle.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Return true when the bundle contains `good`.
    #[must_use]
    pub fn contains(&self, good: GoodId) -> bool {
        self.bundle.binary_search(&good).is_ok()
    }

    /// Additive cost of the bundle under a per-good cost vector (index 0 = good 1).
    #[must_use]
    pub fn cost(&self, costs: &[f64]) -> f64 {
        self.bundle
            .iter()
            .map(|g| costs.get(g - 1).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Combinatorial bid: one agent, several atoms, at most one of which may win.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XorBid {
    agent: AgentId,
    atoms: Vec<AtomicBid>,
}

impl XorBid {
    /// Create a validated XOR bid.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyBid`] when `atoms` is empty and
    /// [`DomainError::ForeignAtom`] when an atom names another agent.
    pub fn try_new(agent: AgentId, atoms: Vec<AtomicBid>) -> Result<Self, DomainError> {
        if atoms.is_empty() {
            return Err(DomainError::EmptyBid { agent });
        }
        if let Some(foreign) = atoms.iter().find(|a| a.agent() != agent) {
            return Err(DomainError::ForeignAtom {
                expected: agent,
                found: foreign.agent(),
            });
        }
        Ok(Self { agent, atoms })
    }

    /// Convenience constructor for a single-atom bid.
    ///
    /// # Errors
    ///
    /// Propagates the validation errors of [`AtomicBid::try_new`].
    pub fn single(agent: AgentId, bundle: Vec<GoodId>, value: f64) -> Result<Self, DomainError> {
        let atom = AtomicBid::try_new(agent, bundle, value)?;
        Ok(Self {
            agent,
            atoms: vec![atom],
        })
    }

    /// Bidding agent.
    #[must_use]
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// XOR disjuncts in submission order.
    #[must_use]
    pub fn atoms(&self) -> &[AtomicBid] {
        &self.atoms
    }

    /// Atom at `index`.
    #[must_use]
    pub fn atom(&self, index: usize) -> Option<&AtomicBid> {
        self.atoms.get(index)
    }

    /// Number of atoms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Always false for a validated bid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
