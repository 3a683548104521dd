//! JSON description of a single auction.
//!
//! ```json
//! {
//!   "goods": 2,
//!   "costs": [0.0, 0.0],
//!   "bids": [
//!     { "agent": 1, "atoms": [{ "bundle": [1], "value": 10.0 }] },
//!     { "agent": 3, "atoms": [{ "bundle": [1, 2], "value": 20.0 }] }
//!   ],
//!   "availability": { "independent": [0.9, 0.9] },
//!   "realization": [1.0, 0.0]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::domain::{
    AgentId, AtomicBid, Auction, DomainError, GoodId, IndependentAvailability,
    JointProbabilityMass, ScenarioAvailability, XorBid,
};
use crate::error::Result;

/// One atomic bid.
#[derive(Debug, Clone, Deserialize)]
pub struct AtomFile {
    pub bundle: Vec<GoodId>,
    pub value: f64,
}

/// One XOR bid.
#[derive(Debug, Clone, Deserialize)]
pub struct BidFile {
    pub agent: AgentId,
    pub atoms: Vec<AtomFile>,
}

/// Availability model of the goods.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityFile {
    /// Independent per-good delivery probabilities.
    Independent(Vec<f64>),
    /// Weighted joint realizations.
    Scenarios(Vec<ScenarioFile>),
}

/// One weighted joint realization.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFile {
    pub weight: f64,
    pub realization: Vec<f64>,
}

/// Auction file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct AuctionFile {
    pub goods: usize,
    pub costs: Vec<f64>,
    #[serde(default)]
    pub supply: Option<Vec<u32>>,
    pub bids: Vec<BidFile>,
    #[serde(default)]
    pub availability: Option<AvailabilityFile>,
    #[serde(default)]
    pub realization: Option<Vec<f64>>,
}

/// Validated auction with its optional availability inputs.
pub struct AuctionInput {
    pub auction: Auction,
    pub model: Option<Box<dyn JointProbabilityMass>>,
    pub realization: Option<Vec<f64>>,
}

impl std::fmt::Debug for AuctionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctionInput")
            .field("auction", &self.auction)
            .field("model", &self.model.as_ref().map(|_| "<dyn JointProbabilityMass>"))
            .field("realization", &self.realization)
            .finish()
    }
}

impl AuctionFile {
    /// Read and parse `path`.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Validate into domain types.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] for invalid bids, costs, supply or
    /// probabilities.
    pub fn into_input(self) -> std::result::Result<AuctionInput, DomainError> {
        let bids = self
            .bids
            .into_iter()
            .map(|bid| {
                let atoms = bid
                    .atoms
                    .into_iter()
                    .map(|atom| AtomicBid::try_new(bid.agent, atom.bundle, atom.value))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                XorBid::try_new(bid.agent, atoms)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let supply = self.supply.unwrap_or_else(|| vec![1; self.goods]);
        let auction = Auction::with_supply(self.goods, supply, self.costs, bids)?;

        let model: Option<Box<dyn JointProbabilityMass>> = match self.availability {
            None => None,
            Some(AvailabilityFile::Independent(probabilities)) => {
                if probabilities.len() != self.goods {
                    return Err(DomainError::LengthMismatch {
                        field: "availability",
                        expected: self.goods,
                        actual: probabilities.len(),
                    });
                }
                Some(Box::new(IndependentAvailability::try_new(probabilities)?))
            }
            Some(AvailabilityFile::Scenarios(scenarios)) => {
                let scenarios = scenarios
                    .into_iter()
                    .map(|s| (s.weight, s.realization))
                    .collect();
                Some(Box::new(ScenarioAvailability::try_new(self.goods, scenarios)?))
            }
        };

        if let Some(realization) = &self.realization {
            if realization.len() != self.goods {
                return Err(DomainError::LengthMismatch {
                    field: "realization",
                    expected: self.goods,
                    actual: realization.len(),
                });
            }
        }

        Ok(AuctionInput {
            auction,
            model,
            realization: self.realization,
        })
    }
}
