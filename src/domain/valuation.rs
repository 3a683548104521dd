//! Availability-weighted values and costs of atoms.

use super::auction::Auction;
use super::availability::AvailabilityWeighting;
use super::bid::AtomicBid;

/// Prices atoms of an auction under an availability weighting.
///
/// The value of an atom is scaled by the availability of its whole bundle;
/// its cost is the sum of each good's cost scaled by that good's own
/// availability.
#[derive(Clone, Copy)]
pub struct Valuation<'a> {
    auction: &'a Auction,
    weighting: &'a dyn AvailabilityWeighting,
}

impl<'a> Valuation<'a> {
    /// Bind an auction to a weighting.
    #[must_use]
    pub fn new(auction: &'a Auction, weighting: &'a dyn AvailabilityWeighting) -> Self {
        Self { auction, weighting }
    }

    /// The underlying auction.
    #[must_use]
    pub const fn auction(&self) -> &'a Auction {
        self.auction
    }

    /// Weighted gross value of `atom`.
    #[must_use]
    pub fn value(&self, atom: &AtomicBid) -> f64 {
        atom.value() * self.weighting.availability(atom.bundle())
    }

    /// Weighted seller cost of `atom`.
    #[must_use]
    pub fn cost(&self, atom: &AtomicBid) -> f64 {
        atom.bundle()
            .iter()
            .map(|g| self.auction.cost_of(*g) * self.weighting.availability(&[*g]))
            .sum()
    }

    /// Weighted surplus `value - cost` of `atom`.
    #[must_use]
    pub fn net(&self, atom: &AtomicBid) -> f64 {
        self.value(atom) - self.cost(atom)
    }

    /// Same valuation over a different auction (used for sub-auctions).
    #[must_use]
    pub fn rebind<'b>(&self, auction: &'b Auction) -> Valuation<'b>
    where
        'a: 'b,
    {
        Valuation {
            auction,
            weighting: self.weighting,
        }
    }
}
