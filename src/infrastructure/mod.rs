//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! mechanism logic.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading, validation and logging setup
//! - [`auction_file`] - JSON auction descriptions for the `solve` command

pub mod auction_file;
pub mod config;
