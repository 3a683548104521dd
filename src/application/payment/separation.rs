//! Core separation oracle.
//!
//! Finds the coalition whose counterfactual welfare most exceeds what its
//! members and the seller jointly receive under the candidate payments.
//! One binary per atom selects the coalition's allocation; one binary per
//! winner (`gamma`) marks a winner that stays outside the coalition and
//! keeps paying its candidate payment.

use tracing::trace;

use super::allocated_terms;
use crate::application::wdp::{BidMatrix, SELECTED};
use crate::domain::constraint::{Constraint, VariableBounds};
use crate::domain::{AgentId, Allocation, Valuation};
use crate::error::SolverError;
use crate::port::{IlpProblem, LpProblem, SolutionStatus, Solver};

/// Outcome of one separation solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationResult {
    /// Coalitional improvement; positive means the payments are blocked.
    pub z: f64,

    /// Agents whose atoms the blocking coalition allocates.
    pub coalition: Vec<AgentId>,
}

impl SeparationResult {
    /// True when `z` is within `tolerance`, i.e. no coalition blocks.
    #[must_use]
    pub fn is_core(&self, tolerance: f64) -> bool {
        self.z <= tolerance
    }

    /// Positions (in allocation order) of the winners outside the coalition.
    #[must_use]
    pub fn outside(&self, allocation: &Allocation) -> Vec<usize> {
        allocation
            .winners()
            .iter()
            .enumerate()
            .filter(|(_, w)| !self.coalition.contains(&w.agent))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Separation problem builder and solver.
pub struct Separation<'s> {
    solver: &'s dyn Solver,
}

impl<'s> Separation<'s> {
    /// Create an oracle on top of `solver`.
    #[must_use]
    pub fn new(solver: &'s dyn Solver) -> Self {
        Self { solver }
    }

    /// Build the separation program for candidate `payments`, aligned with
    /// the winners of `allocation`.
    ///
    /// Variables: every atom of the auction, then one `gamma` per winner.
    /// The program is a minimization of the negated coalition surplus; the
    /// constant `sum net_i` over winners is left out and restored by
    /// [`Separation::solve`].
    #[must_use]
    pub fn problem(
        &self,
        valuation: &Valuation<'_>,
        matrix: &BidMatrix,
        allocation: &Allocation,
        payments: &[f64],
    ) -> IlpProblem {
        let auction = valuation.auction();
        let atoms = matrix.num_atoms();
        let n = atoms + allocation.len();
        let (values, _) = allocated_terms(valuation, allocation);

        let mut lp = LpProblem::new(n);
        lp.bounds = vec![VariableBounds::binary(); n];

        for (bidder, atom, var) in matrix.variables() {
            if let Some(bid) = auction.atom(bidder, atom) {
                lp.objective[var] = -valuation.net(bid);
            }
        }
        for (k, (value, payment)) in values.iter().zip(payments).enumerate() {
            lp.objective[atoms + k] = -(value - payment);
        }

        for good in 1..=auction.goods() {
            lp.constraints.push(Constraint::range(
                matrix.item_coefficients(good, n),
                0.0,
                f64::from(auction.supply_of(good)),
            ));
        }
        for bidder in 0..matrix.num_bidders() {
            let mut row = matrix.xor_coefficients(bidder, n);
            let winner = allocation.winners().iter().position(|w| w.bidder == bidder);
            if let Some(k) = winner {
                row[atoms + k] = 1.0;
            }
            lp.constraints.push(Constraint::leq(row, 1.0));
        }

        IlpProblem::all_binary(lp)
    }

    /// Solve the separation problem for `payments`.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] when the backend fails or the program has no
    /// optimum; the grand coalition is always feasible, so both indicate a
    /// solver problem.
    pub fn solve(
        &self,
        valuation: &Valuation<'_>,
        allocation: &Allocation,
        payments: &[f64],
    ) -> Result<SeparationResult, SolverError> {
        let auction = valuation.auction();
        let matrix = BidMatrix::new(auction);
        let problem = self.problem(valuation, &matrix, allocation, payments);

        let solution = self.solver.solve_ilp(&problem)?;
        match solution.status {
            SolutionStatus::Optimal => {}
            SolutionStatus::Unbounded => {
                return Err(SolverError::Unbounded {
                    stage: "separation",
                })
            }
            SolutionStatus::Infeasible => {
                return Err(SolverError::Infeasible {
                    stage: "separation",
                })
            }
            SolutionStatus::Error => {
                return Err(SolverError::Failed {
                    stage: "separation",
                    reason: "solver reported an error status".into(),
                })
            }
        }

        let (values, costs) = allocated_terms(valuation, allocation);
        let allocated_surplus: f64 = values.iter().zip(&costs).map(|(v, c)| v - c).sum();
        let z = -solution.objective - allocated_surplus;

        let mut coalition = Vec::new();
        for (bidder, atom, var) in matrix.variables() {
            if solution.values[var] > SELECTED {
                if let Some(bid) = auction.atom(bidder, atom) {
                    coalition.push(bid.agent());
                }
            }
        }
        coalition.sort_unstable();
        coalition.dedup();

        trace!(z, coalition = ?coalition, "Separation solved");
        Ok(SeparationResult { z, coalition })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::solver::HiGHSSolver;
    use crate::application::wdp::WinnerDetermination;
    use crate::domain::{Auction, Certain, XorBid};

    fn llg() -> Auction {
        Auction::try_new(
            2,
            vec![0.0, 0.0],
            vec![
                XorBid::single(AgentId::new(1), vec![1], 10.0).unwrap(),
                XorBid::single(AgentId::new(2), vec![2], 12.0).unwrap(),
                XorBid::single(AgentId::new(3), vec![1, 2], 20.0).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn vcg_payments_are_blocked_by_global_bidder() {
        let solver = HiGHSSolver::new();
        let auction = llg();
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = WinnerDetermination::new(&solver).solve(&valuation).unwrap();

        let result = Separation::new(&solver)
            .solve(&valuation, &allocation, &[8.0, 10.0])
            .unwrap();
        assert!((result.z - 2.0).abs() < 1e-6);
        assert_eq!(result.coalition, vec![AgentId::new(3)]);
        assert_eq!(result.outside(&allocation), vec![0, 1]);
    }

    #[test]
    fn core_payments_are_not_blocked() {
        let solver = HiGHSSolver::new();
        let auction = llg();
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = WinnerDetermination::new(&solver).solve(&valuation).unwrap();

        let result = Separation::new(&solver)
            .solve(&valuation, &allocation, &[9.0, 11.0])
            .unwrap();
        assert!(result.is_core(1e-4));
        assert!(result.z >= -1e-6);
    }

    #[test]
    fn separation_is_deterministic() {
        let solver = HiGHSSolver::new();
        let auction = llg();
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = WinnerDetermination::new(&solver).solve(&valuation).unwrap();
        let oracle = Separation::new(&solver);

        let first = oracle.solve(&valuation, &allocation, &[8.5, 10.0]).unwrap();
        let second = oracle.solve(&valuation, &allocation, &[8.5, 10.0]).unwrap();
        assert_eq!(first, second);
        assert!((first.z - 1.5).abs() < 1e-6);
    }

    #[test]
    fn problem_ties_winner_atoms_to_gamma() {
        let solver = HiGHSSolver::new();
        let auction = llg();
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = WinnerDetermination::new(&solver).solve(&valuation).unwrap();
        let matrix = BidMatrix::new(&auction);

        let problem = Separation::new(&solver).problem(&valuation, &matrix, &allocation, &[8.0, 10.0]);
        assert_eq!(problem.lp.num_vars(), 5);
        // two item rows, then one XOR row per bidder
        let local1 = &problem.lp.constraints[2];
        assert_eq!(local1.coefficients, vec![1.0, 0.0, 0.0, 1.0, 0.0]);
        let global = &problem.lp.constraints[4];
        assert_eq!(global.coefficients, vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!((problem.lp.objective[3] + 2.0).abs() < 1e-12);
    }
}
