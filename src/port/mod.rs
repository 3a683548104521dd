//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points that adapters implement to integrate
//! external systems. The only outbound dependency of the payment engine is
//! the optimization backend.
//!
//! # Available Ports
//!
//! - [`Solver`] - LP/ILP/QP optimization backend

mod solver;

pub use solver::{IlpProblem, LpProblem, LpSolution, QpProblem, SolutionStatus, Solver};
