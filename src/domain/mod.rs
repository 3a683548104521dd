//! Auction domain types: bids, auctions, allocations, payments and
//! availability models.

mod allocation;
mod auction;
mod bid;
mod ids;
mod payments;
mod valuation;

pub mod availability;
pub mod constraint;
pub mod error;

// Core domain types
pub use allocation::{Allocation, Winner};
pub use auction::Auction;
pub use bid::{AtomicBid, XorBid};
pub use ids::{AgentId, GoodId};
pub use payments::Payments;
pub use valuation::Valuation;

// Availability models and weightings
pub use availability::{
    realized_availability, AvailabilityMode, AvailabilityWeighting, Blended, Certain, Conditional,
    Expected, IndependentAvailability, JointProbabilityMass, Realized, ScenarioAvailability,
};

pub use error::DomainError;
