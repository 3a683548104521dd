//! Winner determination for XOR combinatorial auctions.
//!
//! The general solver formulates the set-packing MIP over one binary
//! variable per atom; [`llg`] decides the two-local/one-global domain in
//! closed form.

pub mod llg;
mod matrix;

pub use llg::{LlgAuction, LlgRole};
pub use matrix::BidMatrix;

use tracing::{debug, error};

use crate::domain::constraint::{Constraint, VariableBounds};
use crate::domain::{Allocation, Valuation, Winner};
use crate::error::SolverError;
use crate::port::{IlpProblem, LpProblem, SolutionStatus, Solver};

/// Threshold above which a relaxed binary counts as selected.
pub(crate) const SELECTED: f64 = 0.5;

/// General winner-determination solver.
///
/// Maximizes `sum (value - cost) x_a` over atoms subject to item capacity
/// and one atom per bidder. Values and costs come from the valuation.
pub struct WinnerDetermination<'s> {
    solver: &'s dyn Solver,
}

impl<'s> WinnerDetermination<'s> {
    /// Create a winner-determination solver on top of `solver`.
    #[must_use]
    pub fn new(solver: &'s dyn Solver) -> Self {
        Self { solver }
    }

    /// Build the set-packing program for `valuation`'s auction.
    #[must_use]
    pub fn problem(&self, valuation: &Valuation<'_>, matrix: &BidMatrix) -> IlpProblem {
        let auction = valuation.auction();
        let n = matrix.num_atoms();
        let mut lp = LpProblem::new(n);
        lp.bounds = vec![VariableBounds::binary(); n];

        for (bidder, atom, var) in matrix.variables() {
            if let Some(bid) = auction.atom(bidder, atom) {
                lp.objective[var] = -valuation.net(bid);
            }
        }
        for good in 1..=auction.goods() {
            lp.constraints.push(Constraint::leq(
                matrix.item_coefficients(good, n),
                f64::from(auction.supply_of(good)),
            ));
        }
        for bidder in 0..matrix.num_bidders() {
            lp.constraints
                .push(Constraint::leq(matrix.xor_coefficients(bidder, n), 1.0));
        }

        IlpProblem::all_binary(lp)
    }

    /// Compute the welfare-maximizing allocation.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] when the backend fails. Infeasibility cannot
    /// arise from a well-formed auction (allocating nothing is feasible), so
    /// it is reported as an error after logging the model.
    pub fn solve(&self, valuation: &Valuation<'_>) -> Result<Allocation, SolverError> {
        let auction = valuation.auction();
        let matrix = BidMatrix::new(auction);
        if matrix.num_atoms() == 0 {
            return Ok(Allocation::empty());
        }

        let problem = self.problem(valuation, &matrix);
        let solution = self.solver.solve_ilp(&problem)?;
        match solution.status {
            SolutionStatus::Optimal => {}
            status => {
                error!(
                    ?status,
                    agents = auction.num_agents(),
                    goods = auction.goods(),
                    costs = ?auction.costs(),
                    objective = ?problem.lp.objective,
                    "Winner determination has no solution"
                );
                return Err(match status {
                    SolutionStatus::Unbounded => SolverError::Unbounded {
                        stage: "winner determination",
                    },
                    _ => SolverError::Infeasible {
                        stage: "winner determination",
                    },
                });
            }
        }

        let mut winners = Vec::new();
        for (bidder, atom, var) in matrix.variables() {
            if solution.values[var] <= SELECTED {
                continue;
            }
            let Some(bid) = auction.atom(bidder, atom) else {
                continue;
            };
            winners.push(Winner {
                agent: bid.agent(),
                bidder,
                atom,
                bundle: bid.bundle().to_vec(),
                value: valuation.value(bid),
                cost: valuation.cost(bid),
                realized_availability: None,
            });
        }

        let allocation = Allocation::new(winners);
        debug!(
            winners = allocation.len(),
            welfare = allocation.welfare(),
            "Winner determination solved"
        );
        Ok(allocation)
    }

    /// Optimal welfare of `valuation`'s auction.
    ///
    /// # Errors
    ///
    /// Same as [`WinnerDetermination::solve`].
    pub fn welfare(&self, valuation: &Valuation<'_>) -> Result<f64, SolverError> {
        Ok(self.solve(valuation)?.welfare())
    }
}
