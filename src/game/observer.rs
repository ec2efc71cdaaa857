//! Presentation callbacks
//!
//! The controller reports every visible change through this trait and
//! holds no other reference to the presentation layer.

use crate::board::{Cell, Player, Pos};

use super::GameEnd;

pub trait MatchObserver {
    /// A cell's occupant, winning or blocked flag changed
    fn cell_changed(&mut self, _pos: Pos, _cell: &Cell) {}

    /// A stone was committed (sound hook)
    fn stone_played(&mut self, _pos: Pos, _player: Player) {}

    /// The board grew or was replaced; every position may have moved
    fn board_resized(&mut self, _rows: usize, _cols: usize) {}

    /// Transient feedback such as "thinking..." or a rejected move
    fn status(&mut self, _message: &str) {}

    /// The match is over. Return `true` to start a rematch right away.
    fn game_ended(&mut self, _end: &GameEnd) -> bool {
        false
    }
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl MatchObserver for NullObserver {}
