//! Builders for auctions used across tests.
//!
//! Builders panic on invalid input so tests can stay focused on assertions.

use crate::domain::{AgentId, AtomicBid, Auction, GoodId, XorBid};

/// Single-atom XOR bid.
pub fn bid(agent: u32, bundle: &[GoodId], value: f64) -> XorBid {
    XorBid::single(AgentId::new(agent), bundle.to_vec(), value).expect("valid bid")
}

/// XOR bid over several `(bundle, value)` atoms.
pub fn xor_bid(agent: u32, atoms: &[(&[GoodId], f64)]) -> XorBid {
    let id = AgentId::new(agent);
    let atoms = atoms
        .iter()
        .map(|(bundle, value)| AtomicBid::try_new(id, bundle.to_vec(), *value).expect("valid atom"))
        .collect();
    XorBid::try_new(id, atoms).expect("valid XOR bid")
}

/// Auction over `goods` unit-supply goods with zero costs.
pub fn auction(goods: usize, bids: Vec<XorBid>) -> Auction {
    Auction::try_new(goods, vec![0.0; goods], bids).expect("valid auction")
}

/// LLG auction: agent 1 bids `local1` on good 1, agent 2 bids `local2` on
/// good 2 and agent 3 bids `global` on both.
pub fn llg(local1: f64, local2: f64, global: f64, costs: Vec<f64>) -> Auction {
    Auction::try_new(
        2,
        costs,
        vec![
            bid(1, &[1], local1),
            bid(2, &[2], local2),
            bid(3, &[1, 2], global),
        ],
    )
    .expect("valid LLG auction")
}

/// Three single-minded bidders whose VCG payments are already in the core:
/// two disjoint winners and a losing bid on the first good only.
pub fn vcg_in_core() -> Auction {
    auction(2, vec![bid(1, &[1], 10.0), bid(2, &[2], 12.0), bid(3, &[1], 7.0)])
}
