//! Payment rules: VCG, core-selecting and the LLG closed form.
//!
//! Every rule runs against a [`Valuation`], so the same code prices
//! deterministic auctions and the execution-contingent variants; only the
//! availability weighting differs. [`Mechanism`] pairs a rule with an
//! [`AvailabilityMode`] and runs allocation and pricing end to end.

pub mod core_selecting;
pub mod llg;
pub mod separation;
pub mod vcg;

pub use core_selecting::CorePayments;
pub use llg::{llg_core, llg_vcg};
pub use separation::{Separation, SeparationResult};
pub use vcg::VcgRule;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::wdp::{LlgAuction, WinnerDetermination};
use crate::domain::{
    Allocation, Auction, AvailabilityMode, AvailabilityWeighting, Blended, Certain, Conditional,
    DomainError, Expected, JointProbabilityMass, Payments, Realized, Valuation,
};
use crate::error::PaymentError;
use crate::port::Solver;

/// Values and costs of the allocation's winners under `valuation`.
pub(crate) fn allocated_terms(
    valuation: &Valuation<'_>,
    allocation: &Allocation,
) -> (Vec<f64>, Vec<f64>) {
    let auction = valuation.auction();
    allocation
        .winners()
        .iter()
        .map(|w| match auction.atom(w.bidder, w.atom) {
            Some(atom) => (valuation.value(atom), valuation.cost(atom)),
            None => (w.value, w.cost),
        })
        .unzip()
}

/// Constraint-generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Separation values at or below this count as unblocked.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Rounds before giving up with a non-convergence error.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Width of the revenue band the payment QP may use above the minimum.
    #[serde(default = "default_payment_slack")]
    pub payment_slack: f64,

    /// Allowed excess of a VCG payment over the winner's value.
    #[serde(default = "default_ir_tolerance")]
    pub ir_tolerance: f64,
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_max_iterations() -> usize {
    100
}

fn default_payment_slack() -> f64 {
    1e-4
}

fn default_ir_tolerance() -> f64 {
    1e-6
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            payment_slack: default_payment_slack(),
            ir_tolerance: default_ir_tolerance(),
        }
    }
}

/// How winners are charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentRule {
    /// Vickrey-Clarke-Groves.
    Vcg,
    /// Core-selecting payments nearest to VCG, by constraint generation.
    Core,
    /// Core payments of an LLG auction in closed form.
    LlgCore,
}

impl PaymentRule {
    /// Name used in mechanism identifiers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vcg => "vcg",
            Self::Core => "core",
            Self::LlgCore => "llg-core",
        }
    }
}

/// A payment rule evaluated under an availability mode, e.g. `ecr-core`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mechanism {
    /// Payment rule.
    pub rule: PaymentRule,
    /// Availability weighting.
    pub availability: AvailabilityMode,
}

const MODES: [AvailabilityMode; 4] = [
    AvailabilityMode::Expected,
    AvailabilityMode::Conditional,
    AvailabilityMode::Mixed,
    AvailabilityMode::Realized,
];

impl Mechanism {
    /// Pair `rule` with `availability`.
    #[must_use]
    pub const fn new(rule: PaymentRule, availability: AvailabilityMode) -> Self {
        Self { rule, availability }
    }

    /// Run allocation and pricing on `auction`.
    ///
    /// Uncertainty modes allocate on expected availability when `model` is
    /// given (deterministic values otherwise), then attach `realization` to
    /// the allocation before pricing.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::MissingProbabilityModel`] / [`PaymentError::MissingRealization`]
    ///   when the mode's inputs are absent
    /// - [`PaymentError::Domain`] when `model` or `realization` does not
    ///   cover exactly the auction's goods
    /// - [`PaymentError::NotLlg`] for the closed-form rule on other auctions
    /// - any error of the selected payment rule except
    ///   [`PaymentError::VcgInCore`], which becomes [`PaymentStatus::VcgInCore`]
    pub fn run(
        &self,
        solver: &dyn Solver,
        config: &CoreConfig,
        auction: &Auction,
        model: Option<&dyn JointProbabilityMass>,
        realization: Option<Vec<f64>>,
    ) -> Result<Outcome, PaymentError> {
        let mode = self.availability;
        if mode.needs_distribution() && model.is_none() {
            return Err(PaymentError::MissingProbabilityModel {
                mode: mode.as_str(),
            });
        }
        if mode.needs_sample() && realization.is_none() {
            return Err(PaymentError::MissingRealization {
                mode: mode.as_str(),
            });
        }
        if let Some(mass) = model {
            check_goods("availability model", auction.goods(), mass.goods())?;
        }
        if let Some(sample) = &realization {
            check_goods("realization", auction.goods(), sample.len())?;
        }

        let expected;
        let allocation_weighting: &dyn AvailabilityWeighting = match (mode, model) {
            (AvailabilityMode::Certain, _) | (_, None) => &Certain,
            (_, Some(mass)) => {
                expected = Expected::new(mass);
                &expected
            }
        };
        let allocation_valuation = Valuation::new(auction, allocation_weighting);
        let mut allocation = match self.rule {
            PaymentRule::LlgCore => LlgAuction::detect(auction)
                .ok_or(PaymentError::NotLlg)?
                .allocate(&allocation_valuation),
            PaymentRule::Vcg | PaymentRule::Core => {
                WinnerDetermination::new(solver).solve(&allocation_valuation)?
            }
        };
        if let (true, Some(sample)) = (mode.needs_sample(), realization) {
            allocation = allocation.realize(sample);
        }

        let (payments, status) = {
            let weighting = payment_weighting(mode, model, &allocation)?;
            let valuation = Valuation::new(auction, weighting.as_ref());
            self.price(solver, config, &valuation, &allocation)?
        };

        debug!(
            mechanism = %self,
            winners = allocation.len(),
            revenue = payments.revenue(),
            ?status,
            "Mechanism run"
        );
        Ok(Outcome {
            mechanism: *self,
            allocation,
            payments,
            status,
        })
    }

    fn price(
        &self,
        solver: &dyn Solver,
        config: &CoreConfig,
        valuation: &Valuation<'_>,
        allocation: &Allocation,
    ) -> Result<(Payments, PaymentStatus), PaymentError> {
        Ok(match self.rule {
            PaymentRule::Vcg => (
                VcgRule::new(solver, config.ir_tolerance).payments(valuation, allocation)?,
                PaymentStatus::Computed,
            ),
            PaymentRule::Core => match CorePayments::new(solver, *config).compute(valuation, allocation) {
                Ok(payments) => (payments, PaymentStatus::Computed),
                Err(PaymentError::VcgInCore { payments }) => (
                    Payments::new(allocation.agents(), payments),
                    PaymentStatus::VcgInCore,
                ),
                Err(err) => return Err(err),
            },
            PaymentRule::LlgCore => (llg_core(valuation, allocation)?, PaymentStatus::Computed),
        })
    }
}

fn check_goods(field: &'static str, expected: usize, actual: usize) -> Result<(), DomainError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DomainError::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}

/// Weighting used to price `allocation` under `mode`.
///
/// # Errors
///
/// Returns [`PaymentError::MissingProbabilityModel`] or
/// [`PaymentError::MissingRealization`] when `model` or the allocation's
/// sample is required but absent.
pub fn payment_weighting<'a>(
    mode: AvailabilityMode,
    model: Option<&'a dyn JointProbabilityMass>,
    allocation: &'a Allocation,
) -> Result<Box<dyn AvailabilityWeighting + 'a>, PaymentError> {
    let mass = || {
        model.ok_or(PaymentError::MissingProbabilityModel {
            mode: mode.as_str(),
        })
    };
    let sample = || {
        allocation.sample().ok_or(PaymentError::MissingRealization {
            mode: mode.as_str(),
        })
    };

    let weighting: Box<dyn AvailabilityWeighting + 'a> = match mode {
        AvailabilityMode::Certain => Box::new(Certain),
        AvailabilityMode::Expected => Box::new(Expected::new(mass()?)),
        AvailabilityMode::Realized => Box::new(Realized::new(sample()?)),
        AvailabilityMode::Conditional => Box::new(Conditional::new(
            mass()?,
            allocation.allocated_goods(),
            sample()?,
        )),
        AvailabilityMode::Mixed => Box::new(Blended::new(
            mass()?,
            allocation.allocated_goods(),
            sample()?,
        )),
    };
    Ok(weighting)
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.availability.prefix(), self.rule.as_str())
    }
}

impl FromStr for Mechanism {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (availability, rest) = MODES
            .iter()
            .find_map(|mode| s.strip_prefix(mode.prefix()).map(|rest| (*mode, rest)))
            .unwrap_or((AvailabilityMode::Certain, s));
        let rule = match rest {
            "vcg" => PaymentRule::Vcg,
            "core" => PaymentRule::Core,
            "llg-core" => PaymentRule::LlgCore,
            _ => return Err(format!("unknown mechanism '{s}'")),
        };
        Ok(Self::new(rule, availability))
    }
}

impl TryFrom<String> for Mechanism {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mechanism> for String {
    fn from(value: Mechanism) -> Self {
        value.to_string()
    }
}

/// How the reported payments were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    /// The rule produced its payments.
    Computed,
    /// VCG payments were already in the core and are reported as is.
    VcgInCore,
}

/// Allocation and payments of one mechanism run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// Mechanism that produced the outcome.
    pub mechanism: Mechanism,
    /// Chosen allocation, with its realization when the mode uses one.
    pub allocation: Allocation,
    /// Payments aligned with the allocation's winners.
    pub payments: Payments,
    /// Classification of the payments.
    pub status: PaymentStatus,
}
