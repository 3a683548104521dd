//! Corebid - winner determination and core-selecting payment rules for
//! combinatorial auctions with uncertain delivery.
//!
//! Bidders submit XOR bids over bundles of goods, goods carry seller costs,
//! and each good may fail to be delivered. The crate computes the
//! surplus-maximizing allocation, VCG payments, and minimum-revenue core
//! payments nearest to VCG, each under one of several availability
//! weightings (certain, expected, realized, conditional, realized against
//! expected).
//!
//! # Architecture
//!
//! - **`domain`** - Bids, auctions, allocations, payments and availability
//!   models. No solver or IO dependencies.
//! - **`port`** - The [`port::Solver`] trait and its LP/ILP/QP problem types.
//! - **`adapter`** - [`adapter::solver::HiGHSSolver`], backed by HiGHS via
//!   good_lp, with an in-crate active-set method for the payment QP.
//! - **`application`** - Winner determination, payment rules and the
//!   experiment driver.
//! - **`infrastructure`** - TOML configuration, logging setup and the JSON
//!   auction file format.
//! - **`cli`** - The `corebid` command line.
//!
//! # Example
//!
//! ```no_run
//! use corebid::adapter::solver::HiGHSSolver;
//! use corebid::application::payment::{CoreConfig, Mechanism};
//! use corebid::domain::{AgentId, Auction, XorBid};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auction = Auction::try_new(
//!         2,
//!         vec![0.0, 0.0],
//!         vec![
//!             XorBid::single(AgentId::new(1), vec![1], 10.0)?,
//!             XorBid::single(AgentId::new(2), vec![2], 12.0)?,
//!             XorBid::single(AgentId::new(3), vec![1, 2], 20.0)?,
//!         ],
//!     )?;
//!
//!     let mechanism: Mechanism = "core".parse()?;
//!     let outcome = mechanism.run(&HiGHSSolver::new(), &CoreConfig::default(), &auction, None, None)?;
//!     assert!((outcome.payments.revenue() - 20.0).abs() < 1e-3);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
