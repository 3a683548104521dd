//! Random LLG instances.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AgentId, Auction, DomainError, IndependentAvailability, JointProbabilityMass, XorBid,
};

/// Distribution of generated LLG instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlgConfig {
    /// Upper bound of the uniform local values.
    #[serde(default = "default_local_max")]
    pub local_max: f64,

    /// Upper bound of the uniform global value.
    #[serde(default = "default_global_max")]
    pub global_max: f64,

    /// Upper bound of the uniform per-good costs; zero disables costs.
    #[serde(default)]
    pub cost_max: f64,

    /// Probability that each of the two goods is delivered.
    #[serde(default = "default_availability")]
    pub availability: Vec<f64>,
}

fn default_local_max() -> f64 {
    1.0
}

fn default_global_max() -> f64 {
    2.0
}

fn default_availability() -> Vec<f64> {
    vec![0.9, 0.9]
}

impl Default for LlgConfig {
    fn default() -> Self {
        Self {
            local_max: default_local_max(),
            global_max: default_global_max(),
            cost_max: 0.0,
            availability: default_availability(),
        }
    }
}

/// One generated auction with its availability model and realization.
#[derive(Debug, Clone)]
pub struct LlgInstance {
    pub auction: Auction,
    pub model: IndependentAvailability,
    pub realization: Vec<f64>,
}

/// Draws LLG instances: agents 1 and 2 bid on goods 1 and 2, agent 3 on
/// both.
#[derive(Debug, Clone)]
pub struct LlgGenerator {
    config: LlgConfig,
}

impl LlgGenerator {
    /// Create a generator for `config`.
    #[must_use]
    pub const fn new(config: LlgConfig) -> Self {
        Self { config }
    }

    /// Instance number `seed`. The same seed always yields the same
    /// instance, whichever worker draws it.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when the configured probabilities or
    /// bounds are invalid.
    pub fn instance(&self, seed: u64) -> Result<LlgInstance, DomainError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let cfg = &self.config;

        // 1 - U[0, 1) lies in (0, 1], keeping every value strictly positive
        let local1 = (1.0 - rng.gen::<f64>()) * cfg.local_max;
        let local2 = (1.0 - rng.gen::<f64>()) * cfg.local_max;
        let global = (1.0 - rng.gen::<f64>()) * cfg.global_max;
        let costs = vec![rng.gen::<f64>() * cfg.cost_max, rng.gen::<f64>() * cfg.cost_max];

        let auction = Auction::try_new(
            2,
            costs,
            vec![
                XorBid::single(AgentId::new(1), vec![1], local1)?,
                XorBid::single(AgentId::new(2), vec![2], local2)?,
                XorBid::single(AgentId::new(3), vec![1, 2], global)?,
            ],
        )?;
        let model = IndependentAvailability::try_new(cfg.availability.clone())?;
        let realization = model.sample(&mut rng);

        Ok(LlgInstance {
            auction,
            model,
            realization,
        })
    }
}
