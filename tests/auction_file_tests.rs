//! Auction files read from disk and priced end to end.

mod support;

use std::io::Write;

use corebid::adapter::solver::HiGHSSolver;
use corebid::application::payment::{CoreConfig, Mechanism};
use corebid::domain::{AgentId, DomainError};
use corebid::error::Error;
use corebid::infrastructure::auction_file::AuctionFile;
use tempfile::NamedTempFile;

use support::assertions::assert_all_near;

fn write_temp_auction(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp auction");
    file.write_all(contents.as_bytes()).expect("write temp auction");
    file
}

const LLG: &str = r#"{
    "goods": 2,
    "costs": [0.0, 0.0],
    "bids": [
        { "agent": 1, "atoms": [{ "bundle": [1], "value": 10.0 }] },
        { "agent": 2, "atoms": [{ "bundle": [2], "value": 12.0 }] },
        { "agent": 3, "atoms": [{ "bundle": [1, 2], "value": 20.0 }] }
    ],
    "availability": { "independent": [0.9, 0.9] },
    "realization": [1.0, 1.0]
}"#;

#[test]
fn llg_file_prices_to_core_payments() {
    let file = write_temp_auction(LLG);
    let input = AuctionFile::load(file.path()).unwrap().into_input().unwrap();
    let mechanism: Mechanism = "core".parse().unwrap();

    let outcome = mechanism
        .run(
            &HiGHSSolver::new(),
            &CoreConfig::default(),
            &input.auction,
            input.model.as_deref(),
            input.realization,
        )
        .unwrap();

    assert_eq!(outcome.allocation.agents(), vec![AgentId::new(1), AgentId::new(2)]);
    assert_all_near(outcome.payments.amounts(), &[9.0, 11.0], 1e-3);
}

#[test]
fn outcome_serializes_to_json() {
    let file = write_temp_auction(LLG);
    let input = AuctionFile::load(file.path()).unwrap().into_input().unwrap();
    let mechanism: Mechanism = "ecc-vcg".parse().unwrap();

    let outcome = mechanism
        .run(
            &HiGHSSolver::new(),
            &CoreConfig::default(),
            &input.auction,
            input.model.as_deref(),
            input.realization,
        )
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["mechanism"], "ecc-vcg");
    assert_eq!(json["status"], "computed");
    assert!(json["allocation"]["winners"].is_array());
}

#[test]
fn multi_unit_supply_is_read() {
    let file = write_temp_auction(
        r#"{
            "goods": 1,
            "costs": [0.0],
            "supply": [2],
            "bids": [
                { "agent": 1, "atoms": [{ "bundle": [1], "value": 3.0 }] },
                { "agent": 2, "atoms": [{ "bundle": [1], "value": 4.0 }] },
                { "agent": 3, "atoms": [{ "bundle": [1], "value": 1.0 }] }
            ]
        }"#,
    );
    let input = AuctionFile::load(file.path()).unwrap().into_input().unwrap();
    assert_eq!(input.auction.supply_of(1), 2);
    assert!(input.model.is_none());

    let outcome = "vcg"
        .parse::<Mechanism>()
        .unwrap()
        .run(&HiGHSSolver::new(), &CoreConfig::default(), &input.auction, None, None)
        .unwrap();
    // the two highest bids win and each pays the displaced third bid
    assert_all_near(outcome.payments.amounts(), &[1.0, 1.0], 1e-6);
}

#[test]
fn invalid_bid_value_is_rejected() {
    let file = write_temp_auction(
        r#"{
            "goods": 1,
            "costs": [0.0],
            "bids": [{ "agent": 1, "atoms": [{ "bundle": [1], "value": -2.0 }] }]
        }"#,
    );
    let err = AuctionFile::load(file.path()).unwrap().into_input().unwrap_err();
    assert!(matches!(err, DomainError::InvalidValue { .. }));
}

#[test]
fn malformed_json_is_an_error() {
    let file = write_temp_auction("{ \"goods\": 2, ");
    assert!(matches!(AuctionFile::load(file.path()), Err(Error::Json(_))));
}
