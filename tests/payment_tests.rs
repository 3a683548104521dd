//! VCG and core-selecting payments under deterministic delivery.

mod support;

use corebid::adapter::solver::HiGHSSolver;
use corebid::application::payment::{CoreConfig, CorePayments, Separation, VcgRule};
use corebid::application::wdp::WinnerDetermination;
use corebid::domain::{AgentId, Allocation, Auction, Certain, Payments, Valuation};
use corebid::error::PaymentError;
use corebid::port::Solver;
use corebid::testkit::auction::{auction, bid, llg, vcg_in_core};
use corebid::testkit::solver::{CountingSolver, InfeasibleLp};
use rand::rngs::StdRng;
use rand::SeedableRng;

use support::assertions::{assert_all_near, assert_near};
use support::random::xor_auction;

fn allocate(solver: &dyn Solver, auction: &Auction) -> Allocation {
    WinnerDetermination::new(solver)
        .solve(&Valuation::new(auction, &Certain))
        .unwrap()
}

fn core(solver: &dyn Solver, auction: &Auction, config: CoreConfig) -> Result<Payments, PaymentError> {
    let valuation = Valuation::new(auction, &Certain);
    let allocation = allocate(solver, auction);
    CorePayments::new(solver, config).compute(&valuation, &allocation)
}

/// Core payments, accepting VCG when it is already in the core.
fn core_amounts(solver: &dyn Solver, auction: &Auction) -> Vec<f64> {
    match core(solver, auction, CoreConfig::default()) {
        Ok(payments) => payments.amounts().to_vec(),
        Err(PaymentError::VcgInCore { payments }) => payments,
        Err(err) => panic!("unexpected payment error: {err}"),
    }
}

#[test]
fn llg_scenario_vcg_and_core() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let valuation = Valuation::new(&auction, &Certain);
    let allocation = allocate(&solver, &auction);

    let vcg = VcgRule::new(&solver, 1e-6).payments(&valuation, &allocation).unwrap();
    assert_all_near(vcg.amounts(), &[8.0, 10.0], 1e-6);

    let core = CorePayments::new(&solver, CoreConfig::default())
        .compute(&valuation, &allocation)
        .unwrap();
    assert_all_near(core.amounts(), &[9.0, 11.0], 1e-3);
    assert_near(core.revenue(), 20.0, 1e-3);
    assert_eq!(core.iterations(), 1);
}

#[test]
fn single_winner_pays_vcg() {
    let solver = HiGHSSolver::new();
    let auction = auction(2, vec![bid(1, &[1, 2], 15.0), bid(2, &[1], 5.0)]);

    let payments = core(&solver, &auction, CoreConfig::default()).unwrap();
    assert_eq!(payments.agents(), &[AgentId::new(1)]);
    assert_all_near(payments.amounts(), &[5.0], 1e-6);
    assert_eq!(payments.iterations(), 0);
}

#[test]
fn no_winner_means_no_payments() {
    let solver = HiGHSSolver::new();
    let auction = Auction::try_new(1, vec![4.0], vec![bid(1, &[1], 3.0)]).unwrap();

    let payments = core(&solver, &auction, CoreConfig::default()).unwrap();
    assert!(payments.is_empty());
    assert_eq!(payments.revenue(), 0.0);
}

#[test]
fn vcg_in_core_is_reported() {
    let solver = HiGHSSolver::new();
    let err = core(&solver, &vcg_in_core(), CoreConfig::default()).unwrap_err();
    match err {
        PaymentError::VcgInCore { payments } => assert_all_near(&payments, &[7.0, 0.0], 1e-6),
        other => panic!("expected VcgInCore, got {other:?}"),
    }
}

#[test]
fn infeasible_revenue_program_means_empty_core() {
    let solver = InfeasibleLp(HiGHSSolver::new());
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);

    match core(&solver, &auction, CoreConfig::default()).unwrap_err() {
        PaymentError::EmptyCore { vcg } => assert_all_near(&vcg, &[8.0, 10.0], 1e-6),
        other => panic!("expected EmptyCore, got {other:?}"),
    }
}

#[test]
fn iteration_cap_stops_constraint_generation() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let config = CoreConfig {
        max_iterations: 0,
        ..CoreConfig::default()
    };

    match core(&solver, &auction, config).unwrap_err() {
        PaymentError::NonConvergent { iterations, z } => {
            assert_eq!(iterations, 0);
            assert_near(z, 2.0, 1e-6);
        }
        other => panic!("expected NonConvergent, got {other:?}"),
    }
}

#[test]
fn one_round_solves_llg_with_one_lp_and_one_qp() {
    let solver = CountingSolver::new(HiGHSSolver::new());
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let valuation = Valuation::new(&auction, &Certain);
    let allocation = allocate(&solver, &auction);
    let before = solver.ilp_calls();

    CorePayments::new(&solver, CoreConfig::default())
        .compute(&valuation, &allocation)
        .unwrap();

    assert_eq!(solver.lp_calls(), 1);
    assert_eq!(solver.qp_calls(), 1);
    // two VCG subgames plus two separation rounds
    assert_eq!(solver.ilp_calls() - before, 4);
}

#[test]
fn separation_is_idempotent_at_core_payments() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let valuation = Valuation::new(&auction, &Certain);
    let allocation = allocate(&solver, &auction);
    let payments = core_amounts(&solver, &auction);

    let separation = Separation::new(&solver);
    let first = separation.solve(&valuation, &allocation, &payments).unwrap();
    let second = separation.solve(&valuation, &allocation, &payments).unwrap();
    assert!(first.is_core(1e-3));
    assert_near(first.z, second.z, 1e-9);
    assert_eq!(first.coalition, second.coalition);
}

#[test]
fn random_auctions_satisfy_payment_properties() {
    let solver = HiGHSSolver::new();
    let separation = Separation::new(&solver);
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..15 {
        let auction = xor_auction(&mut rng, 3, 4);
        let valuation = Valuation::new(&auction, &Certain);
        let allocation = allocate(&solver, &auction);
        let values: Vec<f64> = allocation.winners().iter().map(|w| w.value).collect();

        let vcg = VcgRule::new(&solver, 1e-6).payments(&valuation, &allocation).unwrap();
        for (p, v) in vcg.amounts().iter().zip(&values) {
            assert!(*p >= -1e-6, "negative VCG payment {p}");
            assert!(*p <= v + 1e-6, "VCG payment {p} above value {v}");
        }

        let payments = core_amounts(&solver, &auction);
        let revenue: f64 = payments.iter().sum();
        assert!(revenue >= vcg.revenue() - 1e-6);
        for ((p, v), floor) in payments.iter().zip(&values).zip(vcg.amounts()) {
            assert!(*p >= floor - 1e-6, "core payment {p} below VCG {floor}");
            assert!(*p <= v + 1e-6, "core payment {p} above value {v}");
        }

        let blocking = separation.solve(&valuation, &allocation, &payments).unwrap();
        assert!(blocking.z <= 1e-3, "payments blocked by {:?}", blocking.coalition);
    }
}
