//! Mathematical constraint types for optimization.
//!
//! These types describe the linear rows and variable bounds shared by the
//! winner-determination, separation and payment programs and the solver
//! port that consumes them.

use serde::{Deserialize, Serialize};

/// A single linear constraint: `sum(coeffs[i] * x[i]) {>=, <=, =, in} rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Coefficients for each variable.
    pub coefficients: Vec<f64>,
    /// Constraint sense.
    pub sense: ConstraintSense,
    /// Right-hand side value. For ranges this is the lower end.
    pub rhs: f64,
}

impl Constraint {
    /// Create a >= constraint.
    #[must_use]
    pub const fn geq(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self {
            coefficients,
            sense: ConstraintSense::GreaterEqual,
            rhs,
        }
    }

    /// Create a <= constraint.
    #[must_use]
    pub const fn leq(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self {
            coefficients,
            sense: ConstraintSense::LessEqual,
            rhs,
        }
    }

    /// Create an = constraint.
    #[must_use]
    pub const fn eq(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self {
            coefficients,
            sense: ConstraintSense::Equal,
            rhs,
        }
    }

    /// Create a two-sided `lower <= sum <= upper` constraint.
    #[must_use]
    pub const fn range(coefficients: Vec<f64>, lower: f64, upper: f64) -> Self {
        Self {
            coefficients,
            sense: ConstraintSense::Range { upper },
            rhs: lower,
        }
    }

    /// Evaluate the left-hand side at `x`.
    #[must_use]
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.coefficients.iter().zip(x).map(|(a, v)| a * v).sum()
    }

    /// Return true when `x` satisfies the row within `tolerance`.
    #[must_use]
    pub fn is_satisfied(&self, x: &[f64], tolerance: f64) -> bool {
        let lhs = self.activity(x);
        match self.sense {
            ConstraintSense::GreaterEqual => lhs >= self.rhs - tolerance,
            ConstraintSense::LessEqual => lhs <= self.rhs + tolerance,
            ConstraintSense::Equal => (lhs - self.rhs).abs() <= tolerance,
            ConstraintSense::Range { upper } => {
                lhs >= self.rhs - tolerance && lhs <= upper + tolerance
            }
        }
    }

    /// Return true when every coefficient is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coefficients.iter().all(|c| *c == 0.0)
    }
}

/// Constraint sense (comparison operator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstraintSense {
    /// Greater than or equal (>=).
    GreaterEqual,
    /// Less than or equal (<=).
    LessEqual,
    /// Equal (=).
    Equal,
    /// Between `rhs` and `upper` inclusive.
    Range {
        /// Upper end of the range.
        upper: f64,
    },
}

/// Bounds on a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableBounds {
    /// Lower bound (None = -infinity).
    pub lower: Option<f64>,
    /// Upper bound (None = +infinity).
    pub upper: Option<f64>,
}

impl Default for VariableBounds {
    fn default() -> Self {
        Self {
            lower: Some(0.0),
            upper: None,
        }
    }
}

impl VariableBounds {
    /// Binary variable bounds [0, 1].
    #[must_use]
    pub const fn binary() -> Self {
        Self {
            lower: Some(0.0),
            upper: Some(1.0),
        }
    }

    /// Free variable (no bounds).
    #[must_use]
    pub const fn free() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    /// Non-negative variable [0, +inf).
    #[must_use]
    pub fn non_negative() -> Self {
        Self::default()
    }

    /// Bounded variable [lower, upper].
    #[must_use]
    pub const fn bounded(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Return true when the bounds admit at least one value.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        }
    }
}
