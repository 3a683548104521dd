//! Per-mechanism tallies of an experiment run.

use serde::Serialize;

use crate::application::payment::Mechanism;

/// Classified result of one mechanism on one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialResult {
    /// Payments computed by the rule.
    Computed { revenue: f64, iterations: usize },
    /// VCG payments were already in the core.
    VcgInCore { revenue: f64 },
    /// No core payments exist; `fallback` is the closed-form LLG revenue
    /// when it applied.
    EmptyCore { fallback: Option<f64> },
    /// The iteration cap was reached.
    NonConvergent,
}

/// Aggregated results of one mechanism.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MechanismStats {
    pub mechanism: Mechanism,
    pub trials: u64,
    pub computed: u64,
    pub vcg_in_core: u64,
    pub empty_core: u64,
    pub fallbacks: u64,
    pub non_convergent: u64,
    revenue_sum: f64,
    priced: u64,
    iterations_sum: u64,
}

impl MechanismStats {
    /// Empty tally for `mechanism`.
    #[must_use]
    pub const fn new(mechanism: Mechanism) -> Self {
        Self {
            mechanism,
            trials: 0,
            computed: 0,
            vcg_in_core: 0,
            empty_core: 0,
            fallbacks: 0,
            non_convergent: 0,
            revenue_sum: 0.0,
            priced: 0,
            iterations_sum: 0,
        }
    }

    /// Add one trial.
    pub fn record(&mut self, result: TrialResult) {
        self.trials += 1;
        match result {
            TrialResult::Computed { revenue, iterations } => {
                self.computed += 1;
                self.add_revenue(revenue);
                self.iterations_sum += iterations as u64;
            }
            TrialResult::VcgInCore { revenue } => {
                self.vcg_in_core += 1;
                self.add_revenue(revenue);
            }
            TrialResult::EmptyCore { fallback } => {
                self.empty_core += 1;
                if let Some(revenue) = fallback {
                    self.fallbacks += 1;
                    self.add_revenue(revenue);
                }
            }
            TrialResult::NonConvergent => self.non_convergent += 1,
        }
    }

    fn add_revenue(&mut self, revenue: f64) {
        self.revenue_sum += revenue;
        self.priced += 1;
    }

    /// Fold another tally of the same mechanism into this one.
    pub fn merge(&mut self, other: &Self) {
        debug_assert_eq!(self.mechanism, other.mechanism);
        self.trials += other.trials;
        self.computed += other.computed;
        self.vcg_in_core += other.vcg_in_core;
        self.empty_core += other.empty_core;
        self.fallbacks += other.fallbacks;
        self.non_convergent += other.non_convergent;
        self.revenue_sum += other.revenue_sum;
        self.priced += other.priced;
        self.iterations_sum += other.iterations_sum;
    }

    /// Mean revenue over the trials that produced payments.
    #[must_use]
    pub fn mean_revenue(&self) -> f64 {
        if self.priced == 0 {
            0.0
        } else {
            self.revenue_sum / self.priced as f64
        }
    }

    /// Mean constraint-generation rounds over computed trials.
    #[must_use]
    pub fn mean_iterations(&self) -> f64 {
        if self.computed == 0 {
            0.0
        } else {
            self.iterations_sum as f64 / self.computed as f64
        }
    }
}

/// Result of a full experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub trials: u64,
    pub seed: u64,
    pub workers: usize,
    pub mechanisms: Vec<MechanismStats>,
}
