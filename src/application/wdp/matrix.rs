//! Binary bid matrix: atom/good incidence per bidder.

use crate::domain::{Auction, GoodId};

/// Per-bidder `[atoms x goods]` 0/1 incidence, plus the flat variable index
/// of every atom.
///
/// Built from an [`Auction`] and never mutated; a new auction (for instance
/// a VCG sub-auction) gets a new matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidMatrix {
    goods: usize,
    rows: Vec<Vec<Vec<u8>>>,
    offsets: Vec<usize>,
    num_atoms: usize,
}

impl BidMatrix {
    /// Derive the matrix from `auction`.
    #[must_use]
    pub fn new(auction: &Auction) -> Self {
        let goods = auction.goods();
        let mut rows = Vec::with_capacity(auction.num_agents());
        let mut offsets = Vec::with_capacity(auction.num_agents());
        let mut num_atoms = 0;

        for bid in auction.bids() {
            offsets.push(num_atoms);
            num_atoms += bid.len();
            let matrix = bid
                .atoms()
                .iter()
                .map(|atom| (1..=goods).map(|g| u8::from(atom.contains(g))).collect())
                .collect();
            rows.push(matrix);
        }

        Self {
            goods,
            rows,
            offsets,
            num_atoms,
        }
    }

    /// Number of goods (columns).
    #[must_use]
    pub const fn goods(&self) -> usize {
        self.goods
    }

    /// Total number of atoms, i.e. atom variables.
    #[must_use]
    pub const fn num_atoms(&self) -> usize {
        self.num_atoms
    }

    /// Number of bidders.
    #[must_use]
    pub fn num_bidders(&self) -> usize {
        self.rows.len()
    }

    /// Number of atoms of `bidder`.
    #[must_use]
    pub fn atoms_of(&self, bidder: usize) -> usize {
        self.rows.get(bidder).map_or(0, Vec::len)
    }

    /// The `[atoms x goods]` matrix of `bidder`.
    #[must_use]
    pub fn bidder(&self, bidder: usize) -> &[Vec<u8>] {
        self.rows.get(bidder).map_or(&[][..], Vec::as_slice)
    }

    /// Flat variable index of `(bidder, atom)`.
    #[must_use]
    pub fn variable(&self, bidder: usize, atom: usize) -> usize {
        self.offsets[bidder] + atom
    }

    /// Iterate `(bidder, atom, variable)` over every atom.
    pub fn variables(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(move |(bidder, atoms)| {
            (0..atoms.len()).map(move |atom| (bidder, atom, self.offsets[bidder] + atom))
        })
    }

    /// Row of an item-capacity constraint for `good` over `width` variables.
    /// Atom variables occupy the first [`BidMatrix::num_atoms`] columns.
    #[must_use]
    pub fn item_coefficients(&self, good: GoodId, width: usize) -> Vec<f64> {
        let mut row = vec![0.0; width];
        for (bidder, atom, var) in self.variables() {
            if self.rows[bidder][atom][good - 1] == 1 {
                row[var] = 1.0;
            }
        }
        row
    }

    /// Row of the XOR constraint of `bidder` over `width` variables.
    #[must_use]
    pub fn xor_coefficients(&self, bidder: usize, width: usize) -> Vec<f64> {
        let mut row = vec![0.0; width];
        for atom in 0..self.atoms_of(bidder) {
            row[self.variable(bidder, atom)] = 1.0;
        }
        row
    }
}
