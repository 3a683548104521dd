//! Stochastic availability of goods and the weighting strategies built on it.
//!
//! A [`JointProbabilityMass`] describes how likely each good is to be
//! delivered. Payment rules never query it directly: they consult an
//! [`AvailabilityWeighting`], which turns a bundle into an availability
//! factor from the realized sample, the unconditional expectation, the
//! expectation conditioned on observed goods, or a per-good blend of the
//! realized and expected figures. Every rule family (VCG, core) runs the same
//! algorithm with a different weighting plugged in.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ids::GoodId;

/// Joint distribution over per-good availability realizations.
///
/// Realizations are vectors with one entry in `[0, 1]` per good (index 0 =
/// good 1); `1.0` means delivered.
pub trait JointProbabilityMass: Send + Sync {
    /// Number of goods covered by the distribution.
    fn goods(&self) -> usize;

    /// Draw one joint realization.
    fn sample(&self, rng: &mut dyn RngCore) -> Vec<f64>;

    /// Probability that every good of `bundle` is available, given the
    /// realizations of `known_goods`.
    ///
    /// `known_goods` and `known_realizations` are index-aligned.
    fn marginal_probability(
        &self,
        bundle: &[GoodId],
        known_goods: &[GoodId],
        known_realizations: &[f64],
    ) -> f64;
}

fn check_unit(field: &'static str, value: f64) -> Result<(), DomainError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::InvalidProbability { field, value })
    }
}

/// Goods fail independently; good `g` is available with probability `p[g-1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndependentAvailability {
    probabilities: Vec<f64>,
}

impl IndependentAvailability {
    /// Create from per-good availability probabilities.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidProbability`] for entries outside [0, 1].
    pub fn try_new(probabilities: Vec<f64>) -> Result<Self, DomainError> {
        for p in &probabilities {
            check_unit("availability probability", *p)?;
        }
        Ok(Self { probabilities })
    }

}

impl JointProbabilityMass for IndependentAvailability {
    fn goods(&self) -> usize {
        self.probabilities.len()
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Vec<f64> {
        self.probabilities
            .iter()
            .map(|p| if rng.gen::<f64>() < *p { 1.0 } else { 0.0 })
            .collect()
    }

    fn marginal_probability(
        &self,
        bundle: &[GoodId],
        known_goods: &[GoodId],
        known_realizations: &[f64],
    ) -> f64 {
        // known goods combine like a realized bundle, unknown ones independently
        let mut known = 1.0_f64;
        let mut unknown = 1.0;
        for g in bundle {
            match known_goods.iter().position(|k| k == g) {
                Some(i) => known = known.min(known_realizations.get(i).copied().unwrap_or(0.0)),
                None => unknown *= self.probabilities.get(g - 1).copied().unwrap_or(0.0),
            }
        }
        known * unknown
    }
}

/// Explicit finite joint distribution: weighted realization scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioAvailability {
    goods: usize,
    scenarios: Vec<(f64, Vec<f64>)>,
}

impl ScenarioAvailability {
    /// Create from `(weight, realization)` pairs. Weights are normalized.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when a realization has the wrong length or
    /// entries outside [0, 1], a weight is negative, or all weights are zero.
    pub fn try_new(goods: usize, scenarios: Vec<(f64, Vec<f64>)>) -> Result<Self, DomainError> {
        let mut total = 0.0;
        for (weight, realization) in &scenarios {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(DomainError::InvalidProbability {
                    field: "scenario weight",
                    value: *weight,
                });
            }
            if realization.len() != goods {
                return Err(DomainError::LengthMismatch {
                    field: "scenario realization",
                    expected: goods,
                    actual: realization.len(),
                });
            }
            for r in realization {
                check_unit("scenario realization", *r)?;
            }
            total += weight;
        }
        if total <= 0.0 {
            return Err(DomainError::EmptyDistribution);
        }

        let scenarios = scenarios
            .into_iter()
            .map(|(w, r)| (w / total, r))
            .collect();
        Ok(Self { goods, scenarios })
    }
}

impl JointProbabilityMass for ScenarioAvailability {
    fn goods(&self) -> usize {
        self.goods
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Vec<f64> {
        let draw: f64 = rng.gen();
        let mut cumulative = 0.0;
        for (weight, realization) in &self.scenarios {
            cumulative += weight;
            if draw < cumulative {
                return realization.clone();
            }
        }
        // Rounding can leave the cumulative sum just below 1.
        self.scenarios
            .last()
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| vec![1.0; self.goods])
    }

    fn marginal_probability(
        &self,
        bundle: &[GoodId],
        known_goods: &[GoodId],
        known_realizations: &[f64],
    ) -> f64 {
        let mut mass = 0.0;
        let mut available = 0.0;
        for (weight, realization) in &self.scenarios {
            let consistent = known_goods.iter().zip(known_realizations).all(|(g, r)| {
                realization
                    .get(g - 1)
                    .is_some_and(|x| (x - r).abs() <= 1e-9)
            });
            if !consistent {
                continue;
            }
            mass += weight;
            available += weight * realized_availability(bundle, realization);
        }
        if mass <= 0.0 {
            0.0
        } else {
            available / mass
        }
    }
}

/// Realized availability of a bundle: the minimum realization across its goods.
///
/// Goods missing from the sample count as unavailable. An empty bundle is
/// always available.
#[must_use]
pub fn realized_availability(bundle: &[GoodId], sample: &[f64]) -> f64 {
    bundle
        .iter()
        .map(|g| sample.get(g - 1).copied().unwrap_or(0.0))
        .fold(1.0, f64::min)
}

fn realizations_of(goods: &[GoodId], sample: &[f64]) -> Vec<f64> {
    goods
        .iter()
        .map(|g| sample.get(g - 1).copied().unwrap_or(0.0))
        .collect()
}

/// Strategy turning bundles into availability factors.
pub trait AvailabilityWeighting {
    /// Factor in [0, 1] applied to the value of `bundle` (and, per good, to
    /// its cost).
    fn availability(&self, bundle: &[GoodId]) -> f64;
}

/// Goods are always delivered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Certain;

impl AvailabilityWeighting for Certain {
    fn availability(&self, _bundle: &[GoodId]) -> f64 {
        1.0
    }
}

/// Unconditional expected availability.
pub struct Expected<'a> {
    mass: &'a dyn JointProbabilityMass,
}

impl<'a> Expected<'a> {
    /// Weight by the marginal probability under `mass`.
    #[must_use]
    pub fn new(mass: &'a dyn JointProbabilityMass) -> Self {
        Self { mass }
    }
}

impl AvailabilityWeighting for Expected<'_> {
    fn availability(&self, bundle: &[GoodId]) -> f64 {
        self.mass.marginal_probability(bundle, &[], &[])
    }
}

/// Availability read from one joint sample.
pub struct Realized<'a> {
    sample: &'a [f64],
}

impl<'a> Realized<'a> {
    /// Weight by the realizations in `sample`.
    #[must_use]
    pub fn new(sample: &'a [f64]) -> Self {
        Self { sample }
    }
}

impl AvailabilityWeighting for Realized<'_> {
    fn availability(&self, bundle: &[GoodId]) -> f64 {
        realized_availability(bundle, self.sample)
    }
}

/// Expected availability conditioned on the realizations of known goods.
pub struct Conditional<'a> {
    mass: &'a dyn JointProbabilityMass,
    known_goods: Vec<GoodId>,
    known_realizations: Vec<f64>,
}

impl<'a> Conditional<'a> {
    /// Condition on the realizations in `sample` of `known_goods`.
    #[must_use]
    pub fn new(mass: &'a dyn JointProbabilityMass, known_goods: Vec<GoodId>, sample: &[f64]) -> Self {
        let known_realizations = realizations_of(&known_goods, sample);
        Self {
            mass,
            known_goods,
            known_realizations,
        }
    }
}

impl AvailabilityWeighting for Conditional<'_> {
    fn availability(&self, bundle: &[GoodId]) -> f64 {
        self.mass
            .marginal_probability(bundle, &self.known_goods, &self.known_realizations)
    }
}

/// Per-good blend: realized availability for the known goods, unconditional
/// expectation for the rest.
///
/// A bundle's factor is the minimum realization over its known goods times
/// the probability that its unknown goods are all delivered. Unlike
/// [`Conditional`], the unknown part ignores what the known realizations say
/// about correlated goods.
pub struct Blended<'a> {
    mass: &'a dyn JointProbabilityMass,
    known_goods: Vec<GoodId>,
    known_realizations: Vec<f64>,
}

impl<'a> Blended<'a> {
    /// Read the realizations of `known_goods` from `sample`; expect the rest
    /// under `mass`.
    #[must_use]
    pub fn new(mass: &'a dyn JointProbabilityMass, known_goods: Vec<GoodId>, sample: &[f64]) -> Self {
        let known_realizations = realizations_of(&known_goods, sample);
        Self {
            mass,
            known_goods,
            known_realizations,
        }
    }
}

impl AvailabilityWeighting for Blended<'_> {
    fn availability(&self, bundle: &[GoodId]) -> f64 {
        let mut realized = 1.0_f64;
        let mut unknown = Vec::new();
        for g in bundle {
            match self.known_goods.iter().position(|k| k == g) {
                Some(i) => realized = realized.min(self.known_realizations[i]),
                None => unknown.push(*g),
            }
        }
        if unknown.is_empty() {
            realized
        } else {
            realized * self.mass.marginal_probability(&unknown, &[], &[])
        }
    }
}

/// Selects the weighting a payment rule runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityMode {
    /// Deterministic delivery.
    #[default]
    Certain,
    /// Expected availability everywhere (`exp-*`).
    Expected,
    /// Realized availability everywhere (`ec-*`).
    Realized,
    /// Expectation conditioned on the allocated goods' realizations (`ecc-*`).
    Conditional,
    /// Realized for the allocated goods, expected for the others (`ecr-*`).
    Mixed,
}

impl AvailabilityMode {
    /// Name prefix used in mechanism names, empty for [`AvailabilityMode::Certain`].
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Certain => "",
            Self::Expected => "exp-",
            Self::Realized => "ec-",
            Self::Conditional => "ecc-",
            Self::Mixed => "ecr-",
        }
    }

    /// Lowercase name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Certain => "certain",
            Self::Expected => "expected",
            Self::Realized => "realized",
            Self::Conditional => "conditional",
            Self::Mixed => "mixed",
        }
    }

    /// True when the weighting needs a realization sample.
    #[must_use]
    pub const fn needs_sample(self) -> bool {
        matches!(self, Self::Realized | Self::Conditional | Self::Mixed)
    }

    /// True when the weighting needs a probability model.
    #[must_use]
    pub const fn needs_distribution(self) -> bool {
        matches!(self, Self::Expected | Self::Conditional | Self::Mixed)
    }
}

impl fmt::Display for AvailabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvailabilityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "certain" => Ok(Self::Certain),
            "expected" => Ok(Self::Expected),
            "realized" => Ok(Self::Realized),
            "conditional" => Ok(Self::Conditional),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!("unknown availability mode '{other}'")),
        }
    }
}
