//! Seeded random XOR auctions.

use corebid::domain::{AgentId, AtomicBid, Auction, XorBid};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;

/// Auction over `goods` unit-supply goods with zero costs. Each bidder
/// places one to three atoms on distinct non-empty bundles, valued between
/// 1 and 10 per good.
pub fn xor_auction(rng: &mut StdRng, goods: usize, bidders: u32) -> Auction {
    let subsets = (1usize << goods) - 1;
    let bids = (1..=bidders)
        .map(|id| {
            let agent = AgentId::new(id);
            let count = rng.gen_range(1..=3.min(subsets));
            let atoms = index::sample(rng, subsets, count)
                .into_iter()
                .map(|i| {
                    let mask = i + 1;
                    let bundle: Vec<usize> = (0..goods)
                        .filter(|g| mask & (1 << g) != 0)
                        .map(|g| g + 1)
                        .collect();
                    let value = rng.gen_range(1.0..10.0) * bundle.len() as f64;
                    AtomicBid::try_new(agent, bundle, value).unwrap()
                })
                .collect();
            XorBid::try_new(agent, atoms).unwrap()
        })
        .collect();
    Auction::try_new(goods, vec![0.0; goods], bids).unwrap()
}
