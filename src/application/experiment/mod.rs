//! Monte Carlo comparison of payment rules on random LLG auctions.
//!
//! Trials are spread over scoped worker threads. Each worker builds its own
//! solver and fills its own tally slot; slots are merged after the join, so
//! workers share nothing mutable.

pub mod generator;
pub mod statistics;

pub use generator::{LlgConfig, LlgGenerator, LlgInstance};
pub use statistics::{ExperimentReport, MechanismStats, TrialResult};

use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::application::payment::{CoreConfig, Mechanism, PaymentRule, PaymentStatus};
use crate::application::wdp::LlgAuction;
use crate::domain::JointProbabilityMass;
use crate::error::{Error, PaymentError, Result};
use crate::port::Solver;

/// Experiment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of generated instances.
    #[serde(default = "default_trials")]
    pub trials: u64,

    /// Base seed; instance `t` uses `seed + t`.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Worker threads, defaulting to the number of CPUs.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Mechanisms evaluated on every instance.
    #[serde(default = "default_mechanisms")]
    pub mechanisms: Vec<Mechanism>,

    /// Instance distribution.
    #[serde(default)]
    pub llg: LlgConfig,
}

fn default_trials() -> u64 {
    1000
}

fn default_seed() -> u64 {
    42
}

fn default_mechanisms() -> Vec<Mechanism> {
    ["vcg", "core"]
        .iter()
        .filter_map(|name| name.parse().ok())
        .collect()
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            seed: default_seed(),
            workers: None,
            mechanisms: default_mechanisms(),
            llg: LlgConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Worker count after applying the CPU default.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Experiment driver.
pub struct Experiment {
    config: ExperimentConfig,
    core: CoreConfig,
}

impl Experiment {
    /// Create a driver.
    #[must_use]
    pub const fn new(config: ExperimentConfig, core: CoreConfig) -> Self {
        Self { config, core }
    }

    /// Run every trial for every mechanism. `make_solver` is called once per
    /// worker.
    ///
    /// Empty cores, VCG-in-core outcomes and iteration-cap hits are tallied,
    /// not raised.
    ///
    /// # Errors
    ///
    /// Returns the first individual-rationality violation, unexpected solver
    /// error or domain error of any worker, or [`Error::WorkerPanicked`].
    pub fn run<S, F>(&self, make_solver: F) -> Result<ExperimentReport>
    where
        S: Solver,
        F: Fn() -> S + Sync,
    {
        let workers = self.config.worker_count();
        let generator = LlgGenerator::new(self.config.llg.clone());
        info!(
            trials = self.config.trials,
            workers,
            mechanisms = self.config.mechanisms.len(),
            "Starting experiment"
        );

        let slots: Vec<Result<Vec<MechanismStats>>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let generator = &generator;
                    let make_solver = &make_solver;
                    scope.spawn(move || {
                        let solver = make_solver();
                        self.worker(worker, workers, generator, &solver)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(Err(Error::WorkerPanicked)))
                .collect()
        });

        let mut totals: Vec<MechanismStats> = self
            .config
            .mechanisms
            .iter()
            .map(|m| MechanismStats::new(*m))
            .collect();
        for slot in slots {
            for (total, part) in totals.iter_mut().zip(&slot?) {
                total.merge(part);
            }
        }

        info!(trials = self.config.trials, "Experiment finished");
        Ok(ExperimentReport {
            trials: self.config.trials,
            seed: self.config.seed,
            workers,
            mechanisms: totals,
        })
    }

    fn worker(
        &self,
        worker: usize,
        workers: usize,
        generator: &LlgGenerator,
        solver: &dyn Solver,
    ) -> Result<Vec<MechanismStats>> {
        let mut stats: Vec<MechanismStats> = self
            .config
            .mechanisms
            .iter()
            .map(|m| MechanismStats::new(*m))
            .collect();

        let mut trial = worker as u64;
        while trial < self.config.trials {
            let instance = generator.instance(self.config.seed.wrapping_add(trial))?;
            for (mechanism, tally) in self.config.mechanisms.iter().zip(stats.iter_mut()) {
                tally.record(self.trial(solver, *mechanism, &instance, trial)?);
            }
            trial += workers as u64;
        }
        Ok(stats)
    }

    /// Classify one mechanism run. Outcomes that are statistics become a
    /// [`TrialResult`]; anything else, individual-rationality violations
    /// included, aborts the experiment.
    fn trial(
        &self,
        solver: &dyn Solver,
        mechanism: Mechanism,
        instance: &LlgInstance,
        trial: u64,
    ) -> Result<TrialResult> {
        let model: &dyn JointProbabilityMass = &instance.model;
        let run = |mechanism: Mechanism| {
            mechanism.run(
                solver,
                &self.core,
                &instance.auction,
                Some(model),
                Some(instance.realization.clone()),
            )
        };

        match run(mechanism) {
            Ok(outcome) => Ok(match outcome.status {
                PaymentStatus::Computed => TrialResult::Computed {
                    revenue: outcome.payments.revenue(),
                    iterations: outcome.payments.iterations(),
                },
                PaymentStatus::VcgInCore => TrialResult::VcgInCore {
                    revenue: outcome.payments.revenue(),
                },
            }),
            Err(PaymentError::EmptyCore { .. }) => {
                let mut fallback = None;
                if LlgAuction::detect(&instance.auction).is_some() {
                    let closed = run(Mechanism::new(PaymentRule::LlgCore, mechanism.availability))?;
                    if closed.allocation.len() == 2 {
                        fallback = Some(closed.payments.revenue());
                    }
                }
                warn!(
                    trial,
                    %mechanism,
                    fallback = ?fallback,
                    "Core is empty, using LLG closed form"
                );
                Ok(TrialResult::EmptyCore { fallback })
            }
            Err(PaymentError::NonConvergent { iterations, z }) => {
                warn!(trial, %mechanism, iterations, z, "Core payments did not converge");
                Ok(TrialResult::NonConvergent)
            }
            Err(err @ PaymentError::IrViolation { .. }) => {
                error!(
                    trial,
                    %mechanism,
                    error = %err,
                    bids = ?instance.auction.bids(),
                    costs = ?instance.auction.costs(),
                    realization = ?instance.realization,
                    "Individual rationality violated"
                );
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}
