//! Closed-form payments for the LLG domain.
//!
//! With two locals winning, the only coalition that can block is the global
//! bidder, so the core reduces to one constraint on the sum of the local
//! payments. The deficit below that sum is shared equally.

use tracing::debug;

use super::allocated_terms;
use crate::application::wdp::{LlgAuction, LlgRole};
use crate::domain::{Allocation, Payments, Valuation};
use crate::error::PaymentError;

/// VCG payments of an LLG allocation without calling a solver.
///
/// # Errors
///
/// Returns [`PaymentError::NotLlg`] when the auction does not have the LLG
/// shape.
pub fn llg_vcg(valuation: &Valuation<'_>, allocation: &Allocation) -> Result<Vec<f64>, PaymentError> {
    let auction = valuation.auction();
    LlgAuction::detect(auction).ok_or(PaymentError::NotLlg)?;

    let (values, costs) = allocated_terms(valuation, allocation);
    let surplus: f64 = values.iter().zip(&costs).map(|(v, c)| v - c).sum();

    let mut payments = Vec::with_capacity(allocation.len());
    for (winner, value) in allocation.winners().iter().zip(&values) {
        let without = auction.without_agent(winner.agent);
        let reduced = LlgAuction::detect(&without)
            .map_or(0.0, |shape| shape.allocate(&valuation.rebind(&without)).welfare());
        payments.push(reduced - (surplus - value));
    }
    Ok(payments)
}

/// Split the LLG core revenue between two winning locals, given their VCG
/// payments in allocation order.
///
/// Revenue is the larger of the VCG revenue and what the global bidder
/// offers for both goods plus their costs; the increase is shared equally,
/// each share capped at the local's value with the overflow moved to the
/// other local. Any allocation other than two locals pays `vcg` unchanged.
#[must_use]
pub fn split(
    shape: &LlgAuction,
    valuation: &Valuation<'_>,
    allocation: &Allocation,
    vcg: &[f64],
) -> Payments {
    let agents = allocation.agents();
    let locals = allocation.winners().iter().all(|w| {
        matches!(shape.role_of(w.bidder), Some(LlgRole::Local1 | LlgRole::Local2))
    });
    if allocation.len() != 2 || !locals {
        return Payments::new(agents, vcg.to_vec());
    }

    let (values, costs) = allocated_terms(valuation, allocation);
    let global = shape
        .surplus(valuation, LlgRole::Global)
        .map_or(0.0, |s| s.max(0.0));
    let vcg_revenue = vcg[0] + vcg[1];
    let mu = vcg_revenue.max(global + costs[0] + costs[1]);

    let share = (mu - vcg_revenue) / 2.0;
    let mut p = [vcg[0] + share, vcg[1] + share];
    for (i, j) in [(0, 1), (1, 0)] {
        let overflow = p[i] - values[i];
        if overflow > 0.0 {
            p[i] = values[i];
            p[j] += overflow;
        }
    }
    for (amount, value) in p.iter_mut().zip(&values) {
        *amount = amount.min(*value);
    }

    debug!(mu, global, payments = ?p, "LLG core split");
    Payments::new(agents, p.to_vec())
}

/// Closed-form core payments for an LLG auction.
///
/// # Errors
///
/// Returns [`PaymentError::NotLlg`] when the auction does not have the LLG
/// shape.
pub fn llg_core(valuation: &Valuation<'_>, allocation: &Allocation) -> Result<Payments, PaymentError> {
    let shape = LlgAuction::detect(valuation.auction()).ok_or(PaymentError::NotLlg)?;
    let vcg = llg_vcg(valuation, allocation)?;
    Ok(split(&shape, valuation, allocation, &vcg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentId, Auction, Certain, XorBid};
    use crate::testkit::auction::llg;

    fn allocate(auction: &Auction) -> Allocation {
        let valuation = Valuation::new(auction, &Certain);
        LlgAuction::detect(auction).unwrap().allocate(&valuation)
    }

    #[test]
    fn closed_form_vcg_matches_externality() {
        let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
        let allocation = allocate(&auction);
        let vcg = llg_vcg(&Valuation::new(&auction, &Certain), &allocation).unwrap();
        assert!((vcg[0] - 8.0).abs() < 1e-12);
        assert!((vcg[1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn deficit_is_split_equally() {
        let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
        let allocation = allocate(&auction);
        let payments = llg_core(&Valuation::new(&auction, &Certain), &allocation).unwrap();
        assert!((payments.amounts()[0] - 9.0).abs() < 1e-12);
        assert!((payments.amounts()[1] - 11.0).abs() < 1e-12);
    }

    #[test]
    fn overflow_moves_to_the_other_local() {
        let auction = llg(2.0, 18.0, 19.5, vec![0.0, 0.0]);
        let allocation = allocate(&auction);
        let valuation = Valuation::new(&auction, &Certain);
        let shape = LlgAuction::detect(&auction).unwrap();
        // an equal share of 3.8 would take local 1 above its value of 2
        let payments = split(&shape, &valuation, &allocation, &[1.9, 10.0]);
        assert!((payments.amounts()[0] - 2.0).abs() < 1e-12);
        assert!((payments.amounts()[1] - 17.5).abs() < 1e-12);
    }

    #[test]
    fn costs_raise_the_revenue_target() {
        let auction = llg(10.0, 12.0, 20.0, vec![1.0, 2.0]);
        let allocation = allocate(&auction);
        let payments = llg_core(&Valuation::new(&auction, &Certain), &allocation).unwrap();
        // VCG (8, 10); global surplus 17 plus costs 3 gives 20
        assert!((payments.revenue() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn global_winner_pays_vcg() {
        let auction = llg(10.0, 12.0, 25.0, vec![0.0, 0.0]);
        let allocation = allocate(&auction);
        let payments = llg_core(&Valuation::new(&auction, &Certain), &allocation).unwrap();
        assert_eq!(payments.agents(), &[AgentId::new(3)]);
        assert!((payments.amounts()[0] - 22.0).abs() < 1e-12);
    }

    #[test]
    fn non_llg_auction_is_rejected() {
        let auction = Auction::try_new(
            3,
            vec![0.0; 3],
            vec![XorBid::single(AgentId::new(1), vec![3], 1.0).unwrap()],
        )
        .unwrap();
        let valuation = Valuation::new(&auction, &Certain);
        let err = llg_core(&valuation, &Allocation::empty()).unwrap_err();
        assert_eq!(err, PaymentError::NotLlg);
    }
}
