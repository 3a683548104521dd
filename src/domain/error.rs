//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new` constructors that validate inputs.
//!
//! # Examples
//!
//! Handling validation errors:
//!
//! ```
//! use corebid::domain::{AgentId, AtomicBid, DomainError};
//!
//! // Empty bundles will fail validation
//! let result = AtomicBid::try_new(AgentId::new(1), vec![], 10.0);
//!
//! assert!(matches!(result, Err(DomainError::EmptyBundle { .. })));
//! ```

use thiserror::Error;

use super::ids::{AgentId, GoodId};

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Every atom must request at least one good.
    #[error("bundle of agent {agent} is empty")]
    EmptyBundle {
        /// Bidder that submitted the bundle.
        agent: AgentId,
    },

    /// Values must be finite and non-negative.
    #[error("value of agent {agent} must be finite and non-negative, got {value}")]
    InvalidValue {
        /// Bidder that submitted the value.
        agent: AgentId,
        /// The rejected value.
        value: f64,
    },

    /// Goods are numbered from 1 to the number of goods in the auction.
    #[error("good {good} is outside 1..={goods}")]
    GoodOutOfRange {
        /// The offending good id.
        good: GoodId,
        /// Number of goods in the auction.
        goods: usize,
    },

    /// An XOR bid must carry at least one atom.
    #[error("bid of agent {agent} has no atoms")]
    EmptyBid {
        /// Bidder with the empty bid.
        agent: AgentId,
    },

    /// Atoms of an XOR bid must belong to the bidding agent.
    #[error("atom of agent {found} placed in the bid of agent {expected}")]
    ForeignAtom {
        /// Agent owning the XOR bid.
        expected: AgentId,
        /// Agent recorded on the atom.
        found: AgentId,
    },

    /// Each agent submits at most one XOR bid.
    #[error("agent {agent} submitted more than one bid")]
    DuplicateAgent {
        /// The repeated agent.
        agent: AgentId,
    },

    /// Per-good vectors must have one entry per good.
    #[error("{field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        /// Name of the vector.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Costs must be finite and non-negative.
    #[error("cost of good {good} must be finite and non-negative, got {cost}")]
    InvalidCost {
        /// The offending good.
        good: GoodId,
        /// The rejected cost.
        cost: f64,
    },

    /// Probabilities and realizations live in [0, 1].
    #[error("{field} must lie in [0, 1], got {value}")]
    InvalidProbability {
        /// Name of the rejected quantity.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A scenario distribution must carry positive total mass.
    #[error("availability distribution has no probability mass")]
    EmptyDistribution,
}
