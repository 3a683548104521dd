//! Mechanisms under uncertain delivery.

mod support;

use corebid::adapter::solver::HiGHSSolver;
use corebid::application::payment::{CoreConfig, Mechanism, PaymentStatus};
use corebid::domain::{AgentId, IndependentAvailability, JointProbabilityMass, ScenarioAvailability};
use corebid::error::PaymentError;
use corebid::testkit::auction::{auction, bid, llg, xor_bid};
use corebid::testkit::solver::CountingSolver;

use support::assertions::{assert_all_near, assert_near};

fn mechanism(name: &str) -> Mechanism {
    name.parse().unwrap()
}

#[test]
fn expected_vcg_weights_values_by_delivery_probability() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let model = IndependentAvailability::try_new(vec![0.5, 1.0]).unwrap();

    let outcome = mechanism("exp-vcg")
        .run(&solver, &CoreConfig::default(), &auction, Some(&model), None)
        .unwrap();

    // expected values 5, 12 and 10
    assert_eq!(outcome.allocation.agents(), vec![AgentId::new(1), AgentId::new(2)]);
    assert_all_near(outcome.payments.amounts(), &[0.0, 5.0], 1e-6);
}

#[test]
fn expected_core_raises_revenue_to_the_global_bid() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let model = IndependentAvailability::try_new(vec![0.5, 1.0]).unwrap();

    let outcome = mechanism("exp-core")
        .run(&solver, &CoreConfig::default(), &auction, Some(&model), None)
        .unwrap();

    assert_eq!(outcome.status, PaymentStatus::Computed);
    assert_near(outcome.payments.revenue(), 10.0, 1e-3);
    let amounts = outcome.payments.amounts();
    assert!(amounts[0] >= -1e-6 && amounts[0] <= 5.0 + 1e-6);
    assert!(amounts[1] >= 5.0 - 1e-6 && amounts[1] <= 12.0 + 1e-6);
}

#[test]
fn full_realization_matches_certain_delivery() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);

    let certain = mechanism("core")
        .run(&solver, &CoreConfig::default(), &auction, None, None)
        .unwrap();
    let realized = mechanism("ec-core")
        .run(&solver, &CoreConfig::default(), &auction, None, Some(vec![1.0, 1.0]))
        .unwrap();

    assert_all_near(realized.payments.amounts(), certain.payments.amounts(), 1e-3);
    assert_eq!(realized.allocation.sample(), Some(&[1.0, 1.0][..]));
}

#[test]
fn conditional_vcg_with_delivered_goods_is_plain_vcg() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let model = IndependentAvailability::try_new(vec![0.9, 0.9]).unwrap();

    let outcome = mechanism("ecc-vcg")
        .run(&solver, &CoreConfig::default(), &auction, Some(&model), Some(vec![1.0, 1.0]))
        .unwrap();

    assert_all_near(outcome.payments.amounts(), &[8.0, 10.0], 1e-6);
}

#[test]
fn mixed_core_with_failed_delivery_keeps_vcg() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let model = IndependentAvailability::try_new(vec![0.9, 0.9]).unwrap();

    let outcome = mechanism("ecr-core")
        .run(&solver, &CoreConfig::default(), &auction, Some(&model), Some(vec![0.0, 1.0]))
        .unwrap();

    // good 1 failed, so neither local 1 nor the global bundle is worth anything
    assert_eq!(outcome.status, PaymentStatus::VcgInCore);
    assert_all_near(outcome.payments.amounts(), &[0.0, 0.0], 1e-6);
}

#[test]
fn mixed_vcg_with_failed_delivery_is_individually_rational() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let model = IndependentAvailability::try_new(vec![0.9, 0.9]).unwrap();

    let outcome = mechanism("ecr-vcg")
        .run(&solver, &CoreConfig::default(), &auction, Some(&model), Some(vec![0.0, 1.0]))
        .unwrap();

    assert_eq!(outcome.allocation.agents(), vec![AgentId::new(1), AgentId::new(2)]);
    assert_all_near(outcome.payments.amounts(), &[0.0, 0.0], 1e-6);
}

#[test]
fn mixed_vcg_expects_goods_left_unallocated() {
    let solver = HiGHSSolver::new();
    let auction = auction(2, vec![bid(1, &[1], 10.0), bid(3, &[1, 2], 18.0)]);
    let model = IndependentAvailability::try_new(vec![0.9, 0.5]).unwrap();
    let realization = Some(vec![1.0, 0.0]);

    let mixed = mechanism("ecr-vcg")
        .run(&solver, &CoreConfig::default(), &auction, Some(&model), realization.clone())
        .unwrap();
    let realized = mechanism("ec-vcg")
        .run(&solver, &CoreConfig::default(), &auction, Some(&model), realization)
        .unwrap();

    // only agent 1 wins, so good 2 is priced at its delivery probability
    assert_eq!(mixed.allocation.agents(), vec![AgentId::new(1)]);
    assert_all_near(mixed.payments.amounts(), &[9.0], 1e-6);
    assert_all_near(realized.payments.amounts(), &[0.0], 1e-6);
}

/// Agent 1 wins good 1 on expectation, good 1 fails, and agent 1 could have
/// used good 3 alongside agent 2's good 2 instead.
fn stranded_alternative() -> corebid::domain::Auction {
    auction(
        3,
        vec![xor_bid(1, &[(&[1][..], 10.0), (&[3][..], 10.0)]), bid(2, &[2], 10.0)],
    )
}

#[test]
fn realized_core_is_empty_when_every_winner_blocks() {
    let solver = CountingSolver::new(HiGHSSolver::new());
    let model = IndependentAvailability::try_new(vec![0.9, 0.9, 0.5]).unwrap();

    let err = mechanism("ec-core")
        .run(
            &solver,
            &CoreConfig::default(),
            &stranded_alternative(),
            Some(&model),
            Some(vec![0.0, 1.0, 1.0]),
        )
        .unwrap_err();

    match err {
        PaymentError::EmptyCore { vcg } => assert_all_near(&vcg, &[0.0, 10.0], 1e-6),
        other => panic!("expected EmptyCore, got {other:?}"),
    }
    // allocation, two VCG sub-auctions and one separation round; no revenue LP
    assert_eq!(solver.ilp_calls(), 4);
    assert_eq!(solver.lp_calls(), 0);
}

#[test]
fn mixed_core_is_empty_when_every_winner_blocks() {
    let solver = CountingSolver::new(HiGHSSolver::new());
    let model = IndependentAvailability::try_new(vec![0.9, 0.9, 0.5]).unwrap();

    let err = mechanism("ecr-core")
        .run(
            &solver,
            &CoreConfig::default(),
            &stranded_alternative(),
            Some(&model),
            Some(vec![0.0, 1.0, 1.0]),
        )
        .unwrap_err();

    // good 3 was not allocated, so agent 1's alternative is worth 10 * 0.5
    match err {
        PaymentError::EmptyCore { vcg } => assert_all_near(&vcg, &[0.0, 5.0], 1e-6),
        other => panic!("expected EmptyCore, got {other:?}"),
    }
    assert_eq!(solver.ilp_calls(), 4);
}

#[test]
fn scenario_model_drives_expected_allocation() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    // both goods arrive together or not at all
    let model = ScenarioAvailability::try_new(2, vec![(0.5, vec![1.0, 1.0]), (0.5, vec![0.0, 0.0])])
        .unwrap();
    assert_near(model.marginal_probability(&[1, 2], &[], &[]), 0.5, 1e-12);

    let outcome = mechanism("exp-vcg")
        .run(&solver, &CoreConfig::default(), &auction, Some(&model), None)
        .unwrap();

    // every value is halved, so payments halve as well
    assert_all_near(outcome.payments.amounts(), &[4.0, 5.0], 1e-6);
}

#[test]
fn missing_inputs_are_typed_errors() {
    let solver = HiGHSSolver::new();
    let auction = llg(10.0, 12.0, 20.0, vec![0.0, 0.0]);
    let config = CoreConfig::default();

    assert!(matches!(
        mechanism("ecr-core").run(&solver, &config, &auction, None, Some(vec![1.0, 1.0])),
        Err(PaymentError::MissingProbabilityModel { mode: "mixed" })
    ));
    assert!(matches!(
        mechanism("ec-vcg").run(&solver, &config, &auction, None, None),
        Err(PaymentError::MissingRealization { mode: "realized" })
    ));
}
