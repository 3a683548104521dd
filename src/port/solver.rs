//! Solver port for linear, integer and quadratic programming.
//!
//! Defines the optimization engine consumed by winner determination, the
//! core separation oracle and the core payment iterator. Every call
//! receives a complete, freshly built problem: no model state survives
//! between solves, so rows added for one step can never leak into the next.
//!
//! # Overview
//!
//! - [`Solver`]: LP / ILP / QP solver interface
//! - [`LpProblem`] / [`IlpProblem`] / [`QpProblem`]: Problem definitions
//! - [`LpSolution`]: Solution representation

use crate::domain::constraint::{Constraint, VariableBounds};
use crate::error::SolverError;

/// Linear, integer and quadratic programming solver.
///
/// Implementations wrap specific solver backends (HiGHS, ...) and provide a
/// unified interface. All problems are minimizations.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`) so that independent
/// auctions can be priced concurrently. Implementations must not keep
/// per-problem state between calls.
///
/// # Status versus errors
///
/// Infeasible and unbounded programs are reported through
/// [`LpSolution::status`], not as errors: callers attach meaning to them
/// (an infeasible payment LP means the core is empty). `Err` is reserved for
/// malformed problems and backend failures.
pub trait Solver: Send + Sync {
    /// Return the solver name for logging and configuration.
    fn name(&self) -> &'static str;

    /// Solve a linear programming problem.
    ///
    /// Minimizes `c * x` subject to the constraints and bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem is malformed or the backend fails.
    fn solve_lp(&self, problem: &LpProblem) -> Result<LpSolution, SolverError>;

    /// Solve an integer linear programming problem.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem is malformed or the backend fails.
    fn solve_ilp(&self, problem: &IlpProblem) -> Result<LpSolution, SolverError>;

    /// Solve a convex quadratic program with a diagonal quadratic term.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem is malformed (non-positive quadratic
    /// weights, dimension mismatch) or the backend fails.
    fn solve_qp(&self, problem: &QpProblem) -> Result<LpSolution, SolverError>;
}

/// Linear programming problem definition.
///
/// Represents a minimization problem of the form:
///
/// ```text
/// minimize    c^T * x
/// subject to  constraints
///             bounds on x
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Objective function coefficients.
    pub objective: Vec<f64>,

    /// Linear constraints on the variables.
    pub constraints: Vec<Constraint>,

    /// Lower and upper bounds for each variable.
    pub bounds: Vec<VariableBounds>,
}

impl LpProblem {
    /// Create a new LP problem with the specified number of variables.
    ///
    /// Initializes all objective coefficients to zero and all variable bounds
    /// to their defaults.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            objective: vec![0.0; num_vars],
            constraints: Vec::new(),
            bounds: vec![VariableBounds::default(); num_vars],
        }
    }

    /// Return the number of decision variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }

    /// Check dimensions of bounds and rows against the objective.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidProblem`] on a mismatch or inverted bounds.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.num_vars();
        if self.bounds.len() != n {
            return Err(SolverError::InvalidProblem(format!(
                "{} bounds for {n} variables",
                self.bounds.len()
            )));
        }
        if let Some((i, _)) = self
            .constraints
            .iter()
            .enumerate()
            .find(|(_, c)| c.coefficients.len() != n)
        {
            return Err(SolverError::InvalidProblem(format!(
                "constraint {i} has wrong width"
            )));
        }
        if let Some(i) = self.bounds.iter().position(|b| !b.is_consistent()) {
            return Err(SolverError::InvalidProblem(format!(
                "variable {i} has lower bound above upper bound"
            )));
        }
        Ok(())
    }
}

/// Integer linear programming problem definition.
///
/// Extends a linear programming problem with integer constraints on specified
/// variables.
#[derive(Debug, Clone, PartialEq)]
pub struct IlpProblem {
    /// Underlying linear programming problem.
    pub lp: LpProblem,

    /// Indices of variables constrained to integer values.
    ///
    /// Variables not in this list are continuous (relaxed).
    pub integer_vars: Vec<usize>,
}

impl IlpProblem {
    /// Create an ILP problem from an LP with specified integer variables.
    #[must_use]
    pub const fn new(lp: LpProblem, integer_vars: Vec<usize>) -> Self {
        Self { lp, integer_vars }
    }

    /// Create an ILP with all variables constrained to integer values.
    #[must_use]
    pub fn all_binary(lp: LpProblem) -> Self {
        let integer_vars: Vec<usize> = (0..lp.num_vars()).collect();
        Self { lp, integer_vars }
    }
}

/// Quadratic programming problem with a diagonal positive-definite term.
///
/// ```text
/// minimize    sum_i quadratic[i] * x_i^2 + c^T * x
/// subject to  constraints
///             bounds on x
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QpProblem {
    /// Linear part, constraints and bounds.
    pub lp: LpProblem,

    /// Diagonal quadratic weights, all strictly positive.
    pub quadratic: Vec<f64>,

    /// Optional feasible starting point.
    pub start: Option<Vec<f64>>,
}

impl QpProblem {
    /// Minimize the squared Euclidean distance to `target` over the feasible
    /// region of `lp` (whose own objective is discarded).
    #[must_use]
    pub fn nearest_point(mut lp: LpProblem, target: &[f64]) -> Self {
        lp.objective = target.iter().map(|t| -2.0 * t).collect();
        let quadratic = vec![1.0; target.len()];
        Self {
            lp,
            quadratic,
            start: None,
        }
    }

    /// Warm-start from a point assumed feasible.
    #[must_use]
    pub fn with_start(mut self, start: Vec<f64>) -> Self {
        self.start = Some(start);
        self
    }

    /// Objective value at `x`.
    #[must_use]
    pub fn objective_at(&self, x: &[f64]) -> f64 {
        x.iter()
            .zip(&self.quadratic)
            .zip(&self.lp.objective)
            .map(|((v, q), c)| q * v * v + c * v)
            .sum()
    }
}

/// Solution to an optimization problem.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// Optimal values for each decision variable.
    pub values: Vec<f64>,

    /// Optimal objective function value.
    pub objective: f64,

    /// Termination status of the solver.
    pub status: SolutionStatus,
}

impl LpSolution {
    /// Return `true` if the solver found an optimal solution.
    #[must_use]
    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Solution carrying only a non-optimal status.
    #[must_use]
    pub fn with_status(num_vars: usize, status: SolutionStatus) -> Self {
        Self {
            values: vec![0.0; num_vars],
            objective: 0.0,
            status,
        }
    }
}

/// Termination status of an optimization solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Solver found a globally optimal solution.
    Optimal,

    /// No feasible solution exists.
    Infeasible,

    /// Objective function is unbounded.
    Unbounded,

    /// Solver encountered an internal error.
    Error,
}
