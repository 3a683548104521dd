//! Core-selecting payments by constraint generation.
//!
//! Starting from VCG, each round asks the separation oracle for the most
//! blocking coalition, turns it into a cut on the winners outside that
//! coalition, finds the least revenue satisfying every cut so far, and
//! picks the payments closest to VCG at that revenue.

use tracing::{debug, error, warn};

use super::separation::Separation;
use super::vcg::VcgRule;
use super::{allocated_terms, CoreConfig};
use crate::domain::constraint::{Constraint, VariableBounds};
use crate::domain::{Allocation, Payments, Valuation};
use crate::error::{PaymentError, SolverError};
use crate::port::{LpProblem, QpProblem, SolutionStatus, Solver};

/// Core payment iterator.
pub struct CorePayments<'s> {
    solver: &'s dyn Solver,
    config: CoreConfig,
}

impl<'s> CorePayments<'s> {
    /// Create the iterator on top of `solver`.
    #[must_use]
    pub fn new(solver: &'s dyn Solver, config: CoreConfig) -> Self {
        Self { solver, config }
    }

    /// Compute core payments for `allocation`.
    ///
    /// A single winner pays VCG. The returned [`Payments`] records the number
    /// of constraint-generation rounds.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::VcgInCore`] when VCG payments are already unblocked
    /// - [`PaymentError::EmptyCore`] when no payments within `[VCG, value]`
    ///   satisfy the generated cuts
    /// - [`PaymentError::NonConvergent`] when the iteration cap is reached
    /// - [`PaymentError::Solver`] on any other solver failure
    pub fn compute(
        &self,
        valuation: &Valuation<'_>,
        allocation: &Allocation,
    ) -> Result<Payments, PaymentError> {
        if allocation.is_empty() {
            return Ok(Payments::none());
        }

        let vcg = VcgRule::new(self.solver, self.config.ir_tolerance)
            .marginal_payments(valuation, allocation)?;
        let agents = allocation.agents();
        if allocation.len() == 1 {
            return Ok(Payments::new(agents, vcg));
        }

        let (values, _) = allocated_terms(valuation, allocation);
        if let Some(i) = (0..vcg.len()).find(|&i| vcg[i] > values[i] + self.config.ir_tolerance) {
            warn!(
                agent = %agents[i],
                vcg = vcg[i],
                value = values[i],
                "VCG payment exceeds value, core is empty"
            );
            return Err(PaymentError::EmptyCore { vcg });
        }

        let bounds: Vec<VariableBounds> = vcg
            .iter()
            .zip(&values)
            .map(|(p, v)| VariableBounds::bounded(*p, v.max(*p)))
            .collect();
        let separation = Separation::new(self.solver);
        let mut cuts: Vec<Constraint> = Vec::new();
        let mut payments = vcg.clone();
        let mut iterations = 0;

        loop {
            let blocking = separation.solve(valuation, allocation, &payments)?;
            debug!(
                iteration = iterations,
                z = blocking.z,
                coalition = ?blocking.coalition,
                payments = ?payments,
                "Separation round"
            );

            if blocking.is_core(self.config.tolerance) {
                if iterations == 0 {
                    return Err(PaymentError::VcgInCore { payments: vcg });
                }
                return Ok(Payments::new(agents, payments).with_iterations(iterations));
            }
            if iterations >= self.config.max_iterations {
                warn!(iterations, z = blocking.z, "Core payments did not converge");
                return Err(PaymentError::NonConvergent {
                    iterations,
                    z: blocking.z,
                });
            }

            let outside = blocking.outside(allocation);
            if outside.is_empty() {
                warn!(z = blocking.z, "Blocking coalition contains every winner, core is empty");
                return Err(PaymentError::EmptyCore { vcg });
            }
            let mut row = vec![0.0; payments.len()];
            let mut rhs = blocking.z;
            for &i in &outside {
                row[i] = 1.0;
                rhs += payments[i];
            }
            cuts.push(Constraint::geq(row, rhs));

            let revenue = LpProblem {
                objective: vec![1.0; payments.len()],
                constraints: cuts.clone(),
                bounds: bounds.clone(),
            };
            let lp = self.solver.solve_lp(&revenue)?;
            match lp.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => {
                    warn!(cuts = cuts.len(), "Revenue program infeasible, core is empty");
                    return Err(PaymentError::EmptyCore { vcg });
                }
                status => {
                    error!(
                        ?status,
                        winners = ?agents,
                        values = ?values,
                        payments = ?payments,
                        vcg = ?vcg,
                        cuts = ?cuts,
                        coalition = ?blocking.coalition,
                        "Revenue program failed"
                    );
                    return Err(status_error("core revenue", status).into());
                }
            }
            let mu: f64 = lp.values.iter().sum();

            let mut nearest = revenue;
            nearest.constraints.push(Constraint::range(
                vec![1.0; payments.len()],
                mu,
                mu + self.config.payment_slack,
            ));
            let qp = QpProblem::nearest_point(nearest, &vcg).with_start(lp.values);
            let solution = match self.solver.solve_qp(&qp) {
                Ok(solution) if solution.is_optimal() => solution,
                Ok(solution) => {
                    error!(
                        status = ?solution.status,
                        winners = ?agents,
                        mu,
                        vcg = ?vcg,
                        cuts = ?cuts,
                        "Payment QP failed"
                    );
                    return Err(status_error("core payments", solution.status).into());
                }
                Err(err) => {
                    error!(
                        error = %err,
                        winners = ?agents,
                        mu,
                        vcg = ?vcg,
                        cuts = ?cuts,
                        "Payment QP failed"
                    );
                    return Err(err.into());
                }
            };

            payments = solution.values;
            iterations += 1;
            debug!(iteration = iterations, mu, payments = ?payments, "Payments updated");
        }
    }
}

fn status_error(stage: &'static str, status: SolutionStatus) -> SolverError {
    match status {
        SolutionStatus::Infeasible => SolverError::Infeasible { stage },
        SolutionStatus::Unbounded => SolverError::Unbounded { stage },
        SolutionStatus::Optimal | SolutionStatus::Error => SolverError::Failed {
            stage,
            reason: "solver reported an error status".into(),
        },
    }
}
