//! Board structure with candidate-move tracking

use serde::{Deserialize, Serialize};

use super::candidates::{CandidateSet, CANDIDATE_RADIUS};
use super::{Edge, Player, Pos, MAX_BOARD_SIZE};
use crate::error::BoardError;

/// A single intersection on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Stone on this cell, if any
    pub occupant: Option<Player>,
    /// Part of the winning line (reset on every resolution pass)
    pub winning: bool,
    /// Dead cell that can never receive a stone
    pub blocked: bool,
}

impl Cell {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none() && !self.blocked
    }
}

/// Game board: a growable grid plus the candidate index
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    max_rows: usize,
    max_cols: usize,
    /// Row-major cells
    cells: Vec<Cell>,
    stones: usize,
    candidates: CandidateSet,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            max_rows: MAX_BOARD_SIZE.max(rows),
            max_cols: MAX_BOARD_SIZE.max(cols),
            cells: vec![Cell::default(); rows * cols],
            stones: 0,
            candidates: CandidateSet::new(),
        }
    }

    /// Cap how far `expand` may grow the board
    #[must_use]
    pub fn with_growth_limit(mut self, max_rows: usize, max_cols: usize) -> Self {
        self.max_rows = max_rows.max(self.rows);
        self.max_cols = max_cols.max(self.cols);
        self
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Check signed coordinates against the current bounds
    #[inline]
    pub fn contains(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// Step `k` times along `(dr, dc)` from `pos`, `None` once off the board
    #[inline]
    pub fn offset(&self, pos: Pos, dr: isize, dc: isize, k: isize) -> Option<Pos> {
        let r = pos.row as isize + dr * k;
        let c = pos.col as isize + dc * k;
        if self.contains(r, c) {
            Some(Pos::new(r as usize, c as usize))
        } else {
            None
        }
    }

    #[inline]
    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.row < self.rows && pos.col < self.cols {
            Some(pos.row * self.cols + pos.col)
        } else {
            None
        }
    }

    /// Get stone at position (`None` for empty or off-board)
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Player> {
        self.cell(pos).and_then(|cell| cell.occupant)
    }

    #[inline]
    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).map(|idx| &self.cells[idx])
    }

    /// Check if position is on the board and can take a stone
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.cell(pos).is_some_and(Cell::is_free)
    }

    /// Total stones on board
    #[inline]
    pub fn stone_count(&self) -> usize {
        self.stones
    }

    pub fn is_board_empty(&self) -> bool {
        self.stones == 0
    }

    /// No free cell left (draw condition)
    pub fn is_full(&self) -> bool {
        !self.cells.iter().any(Cell::is_free)
    }

    /// All cells with their positions, row-major
    pub fn cells(&self) -> impl Iterator<Item = (Pos, &Cell)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (Pos::new(idx / cols, idx % cols), cell))
    }

    /// Occupied positions with their owner, row-major
    pub fn stones(&self) -> impl Iterator<Item = (Pos, Player)> + '_ {
        self.cells()
            .filter_map(|(pos, cell)| cell.occupant.map(|player| (pos, player)))
    }

    pub fn empty_cells(&self) -> Vec<Pos> {
        self.cells()
            .filter(|(_, cell)| cell.is_free())
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Positions within Chebyshev `radius` of `pos`, excluding `pos` itself
    pub fn neighbors(&self, pos: Pos, radius: usize) -> impl Iterator<Item = Pos> {
        let r0 = pos.row.saturating_sub(radius);
        let c0 = pos.col.saturating_sub(radius);
        let r1 = (pos.row + radius).min(self.rows.saturating_sub(1));
        let c1 = (pos.col + radius).min(self.cols.saturating_sub(1));
        (r0..=r1)
            .flat_map(move |r| (c0..=c1).map(move |c| Pos::new(r, c)))
            .filter(move |&p| p != pos)
    }

    /// Place a stone and update the candidate index around it
    pub fn place(&mut self, pos: Pos, player: Player) -> Result<(), BoardError> {
        let idx = self.index(pos).ok_or(BoardError::OutOfBounds(pos))?;
        let cell = &mut self.cells[idx];
        if !cell.is_free() {
            return Err(BoardError::Occupied(pos));
        }
        cell.occupant = Some(player);
        self.stones += 1;

        self.candidates.remove(pos);
        for n in self.neighbors(pos, CANDIDATE_RADIUS) {
            if self.is_empty(n) {
                self.candidates.insert(n);
            }
        }
        Ok(())
    }

    /// Remove a stone (rollback) and repair the candidate index around it
    pub fn remove(&mut self, pos: Pos) -> Option<Player> {
        let idx = self.index(pos)?;
        let previous = self.cells[idx].occupant.take()?;
        self.cells[idx].winning = false;
        self.stones -= 1;

        // Only cells within reach of the removed stone can change status.
        let affected: Vec<Pos> = self
            .neighbors(pos, CANDIDATE_RADIUS)
            .chain(std::iter::once(pos))
            .collect();
        for p in affected {
            if self.is_empty(p) && self.has_stone_near(p) {
                self.candidates.insert(p);
            } else {
                self.candidates.remove(p);
            }
        }
        Some(previous)
    }

    fn has_stone_near(&self, pos: Pos) -> bool {
        self.neighbors(pos, CANDIDATE_RADIUS)
            .any(|n| self.get(n).is_some())
    }

    pub fn set_winning(&mut self, pos: Pos, winning: bool) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx].winning = winning;
        }
    }

    /// Reset every winning flag, returning the cells that changed
    pub fn clear_winning(&mut self) -> Vec<Pos> {
        let cols = self.cols;
        let mut cleared = Vec::new();
        for (idx, cell) in self.cells.iter_mut().enumerate() {
            if cell.winning {
                cell.winning = false;
                cleared.push(Pos::new(idx / cols, idx % cols));
            }
        }
        cleared
    }

    /// Mark a free cell as dead
    pub fn set_blocked(&mut self, pos: Pos) -> Result<(), BoardError> {
        let idx = self.index(pos).ok_or(BoardError::OutOfBounds(pos))?;
        if self.cells[idx].occupant.is_some() {
            return Err(BoardError::Occupied(pos));
        }
        self.cells[idx].blocked = true;
        self.candidates.remove(pos);
        Ok(())
    }

    /// Overwrite a cell wholesale (snapshot restore). Call
    /// `rebuild_candidates` once all cells are written.
    pub(crate) fn write_cell(&mut self, pos: Pos, cell: Cell) -> Result<(), BoardError> {
        let idx = self.index(pos).ok_or(BoardError::OutOfBounds(pos))?;
        let before = self.cells[idx].occupant.is_some();
        let after = cell.occupant.is_some();
        self.cells[idx] = cell;
        match (before, after) {
            (false, true) => self.stones += 1,
            (true, false) => self.stones -= 1,
            _ => {}
        }
        Ok(())
    }

    /// Edges that lie closer than `threshold` lines to `pos`
    pub fn edges_near(&self, pos: Pos, threshold: usize) -> Vec<Edge> {
        let mut edges = Vec::new();
        if pos.row < threshold {
            edges.push(Edge::Top);
        }
        if self.rows - 1 - pos.row < threshold {
            edges.push(Edge::Bottom);
        }
        if pos.col < threshold {
            edges.push(Edge::Left);
        }
        if self.cols - 1 - pos.col < threshold {
            edges.push(Edge::Right);
        }
        edges
    }

    /// Grow the board by one line on `edge`.
    ///
    /// Top and left insertions shift every existing cell by one, so callers
    /// holding positions must shift them too. Returns `false` when the growth
    /// limit is reached.
    pub fn expand(&mut self, edge: Edge) -> bool {
        let (rows, cols, dr, dc) = match edge {
            Edge::Top => (self.rows + 1, self.cols, 1, 0),
            Edge::Bottom => (self.rows + 1, self.cols, 0, 0),
            Edge::Left => (self.rows, self.cols + 1, 0, 1),
            Edge::Right => (self.rows, self.cols + 1, 0, 0),
        };
        if rows > self.max_rows || cols > self.max_cols {
            return false;
        }

        let mut cells = vec![Cell::default(); rows * cols];
        for (idx, cell) in self.cells.iter().enumerate() {
            let r = idx / self.cols + dr;
            let c = idx % self.cols + dc;
            cells[r * cols + c] = *cell;
        }
        self.rows = rows;
        self.cols = cols;
        self.cells = cells;
        self.rebuild_candidates();
        true
    }

    #[inline]
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Recompute the candidate index from scratch (after load or expansion)
    pub fn rebuild_candidates(&mut self) {
        let mut candidates = CandidateSet::new();
        for (pos, _) in self.stones() {
            for n in self.neighbors(pos, CANDIDATE_RADIUS) {
                if self.is_empty(n) {
                    candidates.insert(n);
                }
            }
        }
        self.candidates = candidates;
    }
}
