//! Match orchestration
//!
//! - [`controller`]: turn loop, opponent dispatch, rollback
//! - [`observer`]: presentation callbacks
//! - [`snapshot`]: move rollback records and saved matches

pub mod controller;
pub mod observer;
pub mod snapshot;


use crate::board::{Player, Pos};
use crate::rules::Forbidden;

pub use controller::MatchController;
pub use observer::{MatchObserver, NullObserver};
pub use snapshot::{MatchSnapshot, MoveSnapshot, SavedCell};

/// Result of one move attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The stone stays on the board
    Applied {
        winning_line: Option<Vec<Pos>>,
        is_draw: bool,
    },
    /// Renju restriction; the cell was restored and the turn kept
    RejectedForbidden { reason: Forbidden },
    RejectedOccupied,
    /// Not accepted right now: paused, game over, off-board or not the
    /// human's turn
    Ignored,
}

impl MoveOutcome {
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Applied { .. })
    }
}

/// How a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameEnd {
    /// `None` for a draw
    pub winner: Option<Player>,
    pub has_winner: bool,
}
