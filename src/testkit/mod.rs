//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`auction`] - Builders for bids and auctions, including LLG instances.
//! - [`solver`] - Solver wrappers that count or override backend calls.

pub mod auction;
pub mod solver;
