//! Solver implementations for linear, integer and quadratic programming.
//!
//! Implements the `port::Solver` trait with concrete backends.

mod active_set;
mod highs;

pub use highs::HiGHSSolver;
