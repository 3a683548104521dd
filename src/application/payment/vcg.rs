//! Vickrey-Clarke-Groves payments.
//!
//! A winner pays the welfare the others lose because of its presence: the
//! optimal welfare of the auction without it, minus the welfare of the
//! chosen allocation with its own value removed. Payments are gross, so they
//! include the seller's cost of the winner's bundle.

use tracing::{debug, warn};

use super::allocated_terms;
use crate::application::wdp::WinnerDetermination;
use crate::domain::{Allocation, Payments, Valuation};
use crate::error::{PaymentError, SolverError};
use crate::port::Solver;

/// VCG payment rule.
pub struct VcgRule<'s> {
    wdp: WinnerDetermination<'s>,
    ir_tolerance: f64,
}

impl<'s> VcgRule<'s> {
    /// Create the rule. Payments above a winner's value by more than
    /// `ir_tolerance` are reported as violations.
    #[must_use]
    pub fn new(solver: &'s dyn Solver, ir_tolerance: f64) -> Self {
        Self {
            wdp: WinnerDetermination::new(solver),
            ir_tolerance,
        }
    }

    /// Marginal payment of every winner, in allocation order, without any
    /// individual-rationality check.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] when a sub-auction cannot be solved.
    pub fn marginal_payments(
        &self,
        valuation: &Valuation<'_>,
        allocation: &Allocation,
    ) -> Result<Vec<f64>, SolverError> {
        let auction = valuation.auction();
        let (values, costs) = allocated_terms(valuation, allocation);
        let surplus: f64 = values.iter().zip(&costs).map(|(v, c)| v - c).sum();

        let mut payments = Vec::with_capacity(allocation.len());
        for (winner, value) in allocation.winners().iter().zip(&values) {
            let without = auction.without_agent(winner.agent);
            let reduced = self.wdp.welfare(&valuation.rebind(&without))?;
            // the winner keeps paying for its bundle's cost but brings no value
            let decreased = surplus - value;
            let payment = reduced - decreased;
            debug!(
                agent = %winner.agent,
                reduced_welfare = reduced,
                decreased_welfare = decreased,
                payment,
                "VCG payment computed"
            );
            payments.push(payment);
        }
        Ok(payments)
    }

    /// VCG payments of `allocation`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::IrViolation`] when a payment exceeds the
    /// winner's value beyond the tolerance; payments are never clamped.
    /// Solver failures are propagated.
    pub fn payments(
        &self,
        valuation: &Valuation<'_>,
        allocation: &Allocation,
    ) -> Result<Payments, PaymentError> {
        let amounts = self.marginal_payments(valuation, allocation)?;
        let (values, _) = allocated_terms(valuation, allocation);

        for ((winner, payment), value) in allocation.winners().iter().zip(&amounts).zip(&values) {
            if *payment > value + self.ir_tolerance {
                warn!(
                    agent = %winner.agent,
                    payment,
                    value,
                    "VCG payment violates individual rationality"
                );
                return Err(PaymentError::IrViolation {
                    agent: winner.agent,
                    payment: *payment,
                    value: *value,
                });
            }
        }

        Ok(Payments::new(allocation.agents(), amounts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::solver::HiGHSSolver;
    use crate::domain::{
        AgentId, Auction, Blended, Certain, Expected, IndependentAvailability, Realized, XorBid,
    };
    use crate::testkit::auction::llg;

    #[test]
    fn llg_locals_pay_their_externality() {
        let solver = HiGHSSolver::new();
        let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = WinnerDetermination::new(&solver).solve(&valuation).unwrap();

        let payments = VcgRule::new(&solver, 1e-6)
            .payments(&valuation, &allocation)
            .unwrap();
        assert!((payments.of(AgentId::new(1)).unwrap() - 8.0).abs() < 1e-6);
        assert!((payments.of(AgentId::new(2)).unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn payments_include_bundle_cost() {
        let solver = HiGHSSolver::new();
        let auction = llg(10.0, 12.0, 20.0, vec![1.0, 2.0]);
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = WinnerDetermination::new(&solver).solve(&valuation).unwrap();

        // without local 1: max(12 - 2, 20 - 3) = 17, others keep 10, local 1 costs 1
        let payments = VcgRule::new(&solver, 1e-6)
            .payments(&valuation, &allocation)
            .unwrap();
        assert!((payments.amounts()[0] - 8.0).abs() < 1e-6);
        assert!((payments.amounts()[1] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn single_winner_without_competition_pays_cost() {
        let solver = HiGHSSolver::new();
        let auction = Auction::try_new(
            1,
            vec![1.5],
            vec![XorBid::single(AgentId::new(7), vec![1], 5.0).unwrap()],
        )
        .unwrap();
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = WinnerDetermination::new(&solver).solve(&valuation).unwrap();
        let payments = VcgRule::new(&solver, 1e-6)
            .payments(&valuation, &allocation)
            .unwrap();
        assert!((payments.amounts()[0] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn payments_are_individually_rational_and_non_negative() {
        let solver = HiGHSSolver::new();
        let auction = llg(7.0, 3.0, 9.0, vec![0.5, 0.5]);
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = WinnerDetermination::new(&solver).solve(&valuation).unwrap();
        let payments = VcgRule::new(&solver, 1e-6)
            .payments(&valuation, &allocation)
            .unwrap();
        for (winner, payment) in allocation.winners().iter().zip(payments.amounts()) {
            assert!(*payment >= -1e-6);
            assert!(*payment <= winner.value + 1e-6);
        }
    }

    #[test]
    fn realized_alternative_above_value_violates_ir() {
        let solver = HiGHSSolver::new();
        // the global bid loses on expectation but both goods arrive
        let auction = llg(10.0, 9.0, 20.0, vec![0.0, 0.0]);
        let mass = IndependentAvailability::try_new(vec![0.5, 0.5]).unwrap();
        let allocation = WinnerDetermination::new(&solver)
            .solve(&Valuation::new(&auction, &Expected::new(&mass)))
            .unwrap()
            .realize(vec![1.0, 1.0]);
        assert_eq!(allocation.agents(), vec![AgentId::new(1), AgentId::new(2)]);

        let sample = allocation.sample().unwrap().to_vec();
        let realized = Realized::new(&sample);
        let err = VcgRule::new(&solver, 1e-6)
            .payments(&Valuation::new(&auction, &realized), &allocation)
            .unwrap_err();
        match err {
            PaymentError::IrViolation { agent, payment, value } => {
                assert_eq!(agent, AgentId::new(1));
                assert!((payment - 11.0).abs() < 1e-6);
                assert!((value - 10.0).abs() < 1e-12);
            }
            other => panic!("expected IrViolation, got {other:?}"),
        }
    }

    #[test]
    fn blended_failure_keeps_payments_rational() {
        let solver = HiGHSSolver::new();
        let auction = llg(10.0, 12.0, 21.0, vec![0.0, 0.0]);
        let mass = IndependentAvailability::try_new(vec![0.9, 0.9]).unwrap();
        let allocation = WinnerDetermination::new(&solver)
            .solve(&Valuation::new(&auction, &Expected::new(&mass)))
            .unwrap()
            .realize(vec![0.0, 1.0]);
        assert_eq!(allocation.len(), 2);

        let sample = allocation.sample().unwrap().to_vec();
        let weighting = Blended::new(&mass, allocation.allocated_goods(), &sample);
        let payments = VcgRule::new(&solver, 1e-6)
            .payments(&Valuation::new(&auction, &weighting), &allocation)
            .unwrap();
        assert!(payments.amounts().iter().all(|p| p.abs() < 1e-6));
    }
}
