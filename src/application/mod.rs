//! Application services (use cases).
//!
//! These services orchestrate domain logic and the solver port:
//!
//! - [`wdp`] - Winner determination as an integer program, plus the LLG
//!   closed form
//! - [`payment`] - VCG, core-selecting payments and the mechanism runner
//! - [`experiment`] - Monte Carlo comparison of mechanisms on LLG auctions

pub mod experiment;
pub mod payment;
pub mod wdp;
