//! HiGHS solver implementation via good_lp.
//!
//! HiGHS is a high-performance open-source linear/mixed-integer programming solver.
//! This implementation wraps it using the good_lp crate for ergonomic Rust usage.
//! Quadratic programs are seeded with an LP-feasible point from HiGHS and
//! finished by the active-set refinement in [`super::active_set`].

use good_lp::solvers::highs::highs;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel,
};
use tracing::trace;

use super::active_set;
use crate::domain::constraint::ConstraintSense;
use crate::error::SolverError;
use crate::port::{IlpProblem, LpProblem, LpSolution, QpProblem, SolutionStatus, Solver};

/// Feasibility tolerance accepted for caller-provided warm starts.
const START_TOLERANCE: f64 = 1e-6;

/// HiGHS-based LP/ILP/QP solver.
#[derive(Debug, Default, Clone)]
pub struct HiGHSSolver;

impl HiGHSSolver {
    /// Create a new HiGHS solver instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Solver for HiGHSSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve_lp(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
        problem.validate()?;
        solve_with_good_lp(problem, &[])
    }

    fn solve_ilp(&self, problem: &IlpProblem) -> Result<LpSolution, SolverError> {
        problem.lp.validate()?;
        solve_with_good_lp(&problem.lp, &problem.integer_vars)
    }

    fn solve_qp(&self, problem: &QpProblem) -> Result<LpSolution, SolverError> {
        problem.lp.validate()?;
        let n = problem.lp.num_vars();
        if n == 0 {
            return Ok(LpSolution {
                values: vec![],
                objective: 0.0,
                status: SolutionStatus::Optimal,
            });
        }

        let start = match &problem.start {
            Some(start) if is_feasible(&problem.lp, start) => start.clone(),
            _ => {
                trace!("QP warm start missing or infeasible, solving phase one");
                let phase_one = LpProblem {
                    objective: vec![0.0; n],
                    constraints: problem.lp.constraints.clone(),
                    bounds: problem.lp.bounds.clone(),
                };
                let seed = solve_with_good_lp(&phase_one, &[])?;
                if !seed.is_optimal() {
                    return Ok(LpSolution::with_status(n, seed.status));
                }
                seed.values
            }
        };

        let values = active_set::minimize(problem, &start)?;
        let objective = problem.objective_at(&values);
        Ok(LpSolution {
            values,
            objective,
            status: SolutionStatus::Optimal,
        })
    }
}

fn is_feasible(problem: &LpProblem, x: &[f64]) -> bool {
    x.len() == problem.num_vars()
        && problem.bounds.iter().zip(x).all(|(b, v)| {
            b.lower.map_or(true, |lo| *v >= lo - START_TOLERANCE)
                && b.upper.map_or(true, |hi| *v <= hi + START_TOLERANCE)
        })
        && problem
            .constraints
            .iter()
            .all(|c| c.is_satisfied(x, START_TOLERANCE))
}

/// Internal solver implementation using good_lp.
fn solve_with_good_lp(problem: &LpProblem, integer_vars: &[usize]) -> Result<LpSolution, SolverError> {
    let n = problem.num_vars();

    // Handle empty problem
    if n == 0 {
        let feasible = problem.constraints.iter().all(|c| c.is_satisfied(&[], 0.0));
        let status = if feasible {
            SolutionStatus::Optimal
        } else {
            SolutionStatus::Infeasible
        };
        return Ok(LpSolution::with_status(0, status));
    }

    // Rows without coefficients are decided here; HiGHS gets none of them.
    if problem
        .constraints
        .iter()
        .any(|c| c.is_empty() && !c.is_satisfied(&vec![0.0; n], 0.0))
    {
        return Ok(LpSolution::with_status(n, SolutionStatus::Infeasible));
    }

    // Create variables
    let mut vars = variables!();
    let mut var_list = Vec::with_capacity(n);

    for (i, bounds) in problem.bounds.iter().enumerate() {
        let mut v = variable();

        if let Some(lb) = bounds.lower {
            v = v.min(lb);
        }
        if let Some(ub) = bounds.upper {
            v = v.max(ub);
        }

        if integer_vars.contains(&i) {
            v = v.integer();
        }

        var_list.push(vars.add(v));
    }

    // Build objective function
    let objective: Expression = var_list
        .iter()
        .zip(problem.objective.iter())
        .map(|(v, c)| *c * *v)
        .sum();

    let mut model = vars.minimise(&objective).using(highs);

    for constr in problem.constraints.iter().filter(|c| !c.is_empty()) {
        let lhs: Expression = var_list
            .iter()
            .zip(constr.coefficients.iter())
            .map(|(v, c)| *c * *v)
            .sum();

        let rhs = constr.rhs;

        match constr.sense {
            ConstraintSense::GreaterEqual => {
                model = model.with(constraint!(lhs >= rhs));
            }
            ConstraintSense::LessEqual => {
                model = model.with(constraint!(lhs <= rhs));
            }
            ConstraintSense::Equal => {
                model = model.with(constraint!(lhs == rhs));
            }
            ConstraintSense::Range { upper } => {
                model = model.with(constraint!(lhs.clone() >= rhs));
                model = model.with(constraint!(lhs <= upper));
            }
        }
    }

    match model.solve() {
        Ok(solution) => {
            let values: Vec<f64> = var_list.iter().map(|v| solution.value(*v)).collect();

            // Re-evaluate objective with the solved values
            let obj_value: f64 = values
                .iter()
                .zip(problem.objective.iter())
                .map(|(v, c)| v * c)
                .sum();

            Ok(LpSolution {
                values,
                objective: obj_value,
                status: SolutionStatus::Optimal,
            })
        }
        Err(ResolutionError::Infeasible) => {
            Ok(LpSolution::with_status(n, SolutionStatus::Infeasible))
        }
        Err(ResolutionError::Unbounded) => {
            Ok(LpSolution::with_status(n, SolutionStatus::Unbounded))
        }
        Err(other) => Err(SolverError::Failed {
            stage: "highs",
            reason: other.to_string(),
        }),
    }
}
