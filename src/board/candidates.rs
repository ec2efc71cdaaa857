//! Candidate-move index
//!
//! Holds every free cell within `CANDIDATE_RADIUS` of a stone. The board
//! keeps it current on each placement and removal; only a load or an
//! expansion rebuilds it from scratch.

use std::collections::BTreeSet;

use super::Pos;

/// Chebyshev radius around each stone that is worth considering
pub const CANDIDATE_RADIUS: usize = 2;

/// Ordered set of candidate positions (row-major iteration)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    cells: BTreeSet<Pos>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        self.cells.contains(&pos)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Pos> + '_ {
        self.cells.iter().copied()
    }

    #[inline]
    pub(crate) fn insert(&mut self, pos: Pos) {
        self.cells.insert(pos);
    }

    #[inline]
    pub(crate) fn remove(&mut self, pos: Pos) {
        self.cells.remove(&pos);
    }
}
