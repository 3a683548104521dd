//! Solver wrappers for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::SolverError;
use crate::port::{IlpProblem, LpProblem, LpSolution, QpProblem, SolutionStatus, Solver};

/// Delegates to an inner solver and counts calls per program type.
#[derive(Debug, Default)]
pub struct CountingSolver<S> {
    inner: S,
    lp: AtomicUsize,
    ilp: AtomicUsize,
    qp: AtomicUsize,
}

impl<S: Solver> CountingSolver<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lp: AtomicUsize::new(0),
            ilp: AtomicUsize::new(0),
            qp: AtomicUsize::new(0),
        }
    }

    /// Number of LP solves.
    pub fn lp_calls(&self) -> usize {
        self.lp.load(Ordering::Relaxed)
    }

    /// Number of ILP solves (winner determination and separation).
    pub fn ilp_calls(&self) -> usize {
        self.ilp.load(Ordering::Relaxed)
    }

    /// Number of QP solves.
    pub fn qp_calls(&self) -> usize {
        self.qp.load(Ordering::Relaxed)
    }
}

impl<S: Solver> Solver for CountingSolver<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn solve_lp(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
        self.lp.fetch_add(1, Ordering::Relaxed);
        self.inner.solve_lp(problem)
    }

    fn solve_ilp(&self, problem: &IlpProblem) -> Result<LpSolution, SolverError> {
        self.ilp.fetch_add(1, Ordering::Relaxed);
        self.inner.solve_ilp(problem)
    }

    fn solve_qp(&self, problem: &QpProblem) -> Result<LpSolution, SolverError> {
        self.qp.fetch_add(1, Ordering::Relaxed);
        self.inner.solve_qp(problem)
    }
}

/// Reports every LP as infeasible and delegates the rest, emulating a
/// revenue program with no feasible point.
#[derive(Debug, Default)]
pub struct InfeasibleLp<S>(pub S);

impl<S: Solver> Solver for InfeasibleLp<S> {
    fn name(&self) -> &'static str {
        "infeasible-lp"
    }

    fn solve_lp(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
        Ok(LpSolution::with_status(
            problem.num_vars(),
            SolutionStatus::Infeasible,
        ))
    }

    fn solve_ilp(&self, problem: &IlpProblem) -> Result<LpSolution, SolverError> {
        self.0.solve_ilp(problem)
    }

    fn solve_qp(&self, problem: &QpProblem) -> Result<LpSolution, SolverError> {
        self.0.solve_qp(problem)
    }
}
