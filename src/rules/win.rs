//! Win condition checking
//!
//! Only the four lines through the stone just played are scanned. The
//! maximal contiguous run decides the result, so a run of six is seen as
//! six and never as a five with an extra stone.

use super::GameRule;
use crate::board::{Board, Player, Pos, DIRECTIONS};

/// Maximal run of `player` stones along `(dr, dc)` through `pos`.
///
/// `pos` itself always counts as `player`, so this works for a stone that
/// is about to be placed. The returned positions are ordered along the
/// direction.
pub fn run_through(board: &Board, pos: Pos, player: Player, dr: isize, dc: isize) -> Vec<Pos> {
    let mut line = vec![pos];

    // Negative direction first
    let mut k = 1;
    while let Some(prev) = board.offset(pos, dr, dc, -k) {
        if board.get(prev) != Some(player) {
            break;
        }
        line.insert(0, prev);
        k += 1;
    }

    // Positive direction
    k = 1;
    while let Some(next) = board.offset(pos, dr, dc, k) {
        if board.get(next) != Some(player) {
            break;
        }
        line.push(next);
        k += 1;
    }

    line
}

/// Does a run of `len` stones win for `player` under `rule`?
#[inline]
pub fn wins_with(rule: GameRule, player: Player, len: usize) -> bool {
    match rule {
        GameRule::Freestyle => len >= 5,
        GameRule::Standard => len == 5,
        GameRule::Renju => match player {
            Player::X => len == 5,
            Player::O => len >= 5,
        },
    }
}

/// Winning line through the stone at `pos`, if that stone ends the game.
///
/// Returns `None` for an empty cell.
pub fn winning_line(board: &Board, pos: Pos, rule: GameRule) -> Option<Vec<Pos>> {
    let player = board.get(pos)?;
    DIRECTIONS.iter().find_map(|&(dr, dc)| {
        let run = run_through(board, pos, player, dr, dc);
        wins_with(rule, player, run.len()).then_some(run)
    })
}

#[inline]
pub fn is_win(board: &Board, pos: Pos, rule: GameRule) -> bool {
    winning_line(board, pos, rule).is_some()
}

/// Scan every stone for a winning line (used after restoring a position)
pub fn find_winning_line(board: &Board, rule: GameRule) -> Option<(Player, Vec<Pos>)> {
    board.stones().find_map(|(pos, player)| {
        winning_line(board, pos, rule).map(|line| (player, line))
    })
}
