//! Move rollback records and persisted match state

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, Player, Pos};
use crate::error::MatchError;
use crate::rules::GameRule;

/// State needed to undo one optimistically applied move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSnapshot {
    pub pos: Pos,
    pub prior_occupant: Option<Player>,
    pub prior_last_move: Option<Pos>,
    pub prior_player: Player,
}

/// One non-default cell of a saved board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCell {
    pub pos: Pos,
    pub cell: Cell,
}

/// Everything needed to resume a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub rule: GameRule,
    pub current_player: Player,
    /// Occupied, winning or blocked cells only
    pub cells: Vec<SavedCell>,
    pub last_move: Option<Pos>,
}

impl MatchSnapshot {
    pub fn capture(board: &Board, rule: GameRule, current_player: Player, last_move: Option<Pos>) -> Self {
        let cells = board
            .cells()
            .filter(|(_, cell)| **cell != Cell::default())
            .map(|(pos, cell)| SavedCell { pos, cell: *cell })
            .collect();
        Self {
            rows: board.rows(),
            cols: board.cols(),
            rule,
            current_player,
            cells,
            last_move,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Rebuild the saved grid (candidate index included)
    pub fn to_board(&self, max_rows: usize, max_cols: usize) -> Result<Board, MatchError> {
        let mut board = Board::new(self.rows, self.cols).with_growth_limit(max_rows, max_cols);
        for saved in &self.cells {
            board
                .write_cell(saved.pos, saved.cell)
                .map_err(|_| MatchError::CellOutOfBounds(saved.pos))?;
        }
        if let Some(last) = self.last_move {
            if board.cell(last).is_none() {
                return Err(MatchError::CellOutOfBounds(last));
            }
        }
        board.rebuild_candidates();
        Ok(board)
    }
}
