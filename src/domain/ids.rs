//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bidder identifier - newtype for type safety.
///
/// Agent ids are opaque labels supplied by the caller; they need not be
/// contiguous. Index 0 is not reserved for the auctioneer at this level, the
/// auctioneer is implicit in every [`Allocation`](super::Allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(u32);

impl AgentId {
    /// Create a new agent id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Return the raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Good identifier. Goods are numbered from 1.
pub type GoodId = usize;
