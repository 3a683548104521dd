use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::AgentId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Optimization backend errors.
///
/// Infeasibility met where the caller expects a feasible program (anything
/// other than the core payment LP) also ends up here, tagged with the stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("{stage} program is infeasible")]
    Infeasible { stage: &'static str },

    #[error("{stage} program is unbounded")]
    Unbounded { stage: &'static str },

    #[error("{stage} solve failed: {reason}")]
    Failed { stage: &'static str, reason: String },

    #[error("invalid problem: {0}")]
    InvalidProblem(String),
}

/// Payment-rule outcomes other than a computed payment vector.
///
/// `EmptyCore` and `VcgInCore` are informative outcomes that experiment
/// drivers tally; `IrViolation` signals an internal inconsistency.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentError {
    #[error("the core is empty")]
    EmptyCore {
        /// VCG payments of the allocation, for callers that fall back.
        vcg: Vec<f64>,
    },

    #[error("VCG payments already lie in the core")]
    VcgInCore {
        /// The VCG payments, aligned with the allocation's winners.
        payments: Vec<f64>,
    },

    #[error("payment {payment} of agent {agent} exceeds its value {value}")]
    IrViolation {
        agent: AgentId,
        payment: f64,
        value: f64,
    },

    #[error("core payments did not converge after {iterations} iterations (z = {z})")]
    NonConvergent { iterations: usize, z: f64 },

    #[error("auction is not an LLG instance")]
    NotLlg,

    #[error("{mode} availability requires a probability model")]
    MissingProbabilityModel { mode: &'static str },

    #[error("{mode} availability requires a realized sample on the allocation")]
    MissingRealization { mode: &'static str },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;
