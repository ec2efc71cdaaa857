//! Renju forbidden-move detection for the first player
//!
//! X may not create, with a single stone:
//! 1. an overline (six or more in a row)
//! 2. a double-four (two fours at once, in one or two lines)
//! 3. a double-three (two open threes at once)
//!
//! Checks run in that order. A move that makes exactly five wins outright
//! and is never forbidden unless it is also an overline.
//!
//! Every check works on an 11-cell window through the candidate stone, one
//! per direction. Off-board cells read as opponent stones.

use std::collections::HashSet;
use std::fmt;

use super::GameRule;
use crate::board::{Board, Player, Pos, DIRECTIONS};

/// Reach of the window on each side of the candidate stone
const SPAN: usize = 5;
const LEN: usize = 2 * SPAN + 1;
const CENTER: usize = SPAN;

/// Why a move was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Forbidden {
    Overline,
    DoubleFour,
    DoubleThree,
}

impl Forbidden {
    pub fn message(self) -> &'static str {
        match self {
            Forbidden::Overline => "overline forbidden.",
            Forbidden::DoubleFour => "double-four forbidden.",
            Forbidden::DoubleThree => "double-three forbidden.",
        }
    }
}

impl fmt::Display for Forbidden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Own,
    Empty,
    Blocked,
}

/// One direction through the candidate stone, from the mover's view
#[derive(Debug, Clone)]
struct Line {
    slots: [Slot; LEN],
    cells: [Option<Pos>; LEN],
}

/// A four inside one line: the stones it is made of and the cell that
/// completes it
#[derive(Debug, Clone, Copy)]
struct Four {
    stones: u16,
    completion: usize,
}

impl Line {
    fn extract(board: &Board, pos: Pos, player: Player, dr: isize, dc: isize) -> Self {
        let mut slots = [Slot::Blocked; LEN];
        let mut cells = [None; LEN];
        for i in 0..LEN {
            let k = i as isize - SPAN as isize;
            let Some(p) = board.offset(pos, dr, dc, k) else {
                continue;
            };
            cells[i] = Some(p);
            slots[i] = if k == 0 {
                Slot::Own
            } else {
                match board.cell(p) {
                    Some(cell) if cell.occupant == Some(player) => Slot::Own,
                    Some(cell) if cell.is_free() => Slot::Empty,
                    _ => Slot::Blocked,
                }
            };
        }
        Self { slots, cells }
    }

    /// Inclusive bounds of the run of own stones containing `i`
    fn run_bounds(&self, i: usize) -> (usize, usize) {
        let mut lo = i;
        while lo > 0 && self.slots[lo - 1] == Slot::Own {
            lo -= 1;
        }
        let mut hi = i;
        while hi + 1 < LEN && self.slots[hi + 1] == Slot::Own {
            hi += 1;
        }
        (lo, hi)
    }

    fn run_len(&self, i: usize) -> usize {
        let (lo, hi) = self.run_bounds(i);
        hi - lo + 1
    }

    /// Copy of the line with an extra own stone at `i`
    fn with_stone(&self, i: usize) -> Line {
        let mut line = self.clone();
        line.slots[i] = Slot::Own;
        line
    }

    /// Playing at `i` would make exactly five
    fn makes_five(&self, i: usize) -> bool {
        self.slots[i] == Slot::Empty && self.with_stone(i).run_len(i) == 5
    }

    /// Distinct fours through the center.
    ///
    /// A five-cell window holding four own stones and one empty cell is a
    /// four when filling it makes exactly five. Windows sharing the same
    /// four stones (`_XXXX_`) are the same four.
    fn fours(&self) -> Vec<Four> {
        let mut fours: Vec<Four> = Vec::new();
        for start in CENTER - 4..=CENTER {
            let window = start..start + 5;
            if window.clone().any(|i| self.slots[i] == Slot::Blocked) {
                continue;
            }
            let empties: Vec<usize> = window
                .clone()
                .filter(|&i| self.slots[i] == Slot::Empty)
                .collect();
            let &[completion] = empties.as_slice() else {
                continue;
            };
            if !self.makes_five(completion) {
                continue;
            }
            let stones = window
                .filter(|&i| self.slots[i] == Slot::Own)
                .fold(0u16, |mask, i| mask | (1 << i));
            if !fours.iter().any(|four| four.stones == stones) {
                fours.push(Four { stones, completion });
            }
        }
        fours
    }

    /// Four own stones in a row through the center with both ends able to
    /// become exactly five
    fn has_open_four(&self) -> bool {
        let (lo, hi) = self.run_bounds(CENTER);
        hi - lo + 1 == 4
            && lo >= 1
            && hi + 1 < LEN
            && self.makes_five(lo - 1)
            && self.makes_five(hi + 1)
    }

    /// Empty cells that would turn this line into an open four
    fn three_completions(&self) -> Vec<usize> {
        (CENTER - 4..=CENTER + 4)
            .filter(|&i| i != CENTER && self.slots[i] == Slot::Empty)
            .filter(|&i| self.with_stone(i).has_open_four())
            .collect()
    }
}

fn lines(board: &Board, pos: Pos, player: Player) -> [Line; 4] {
    DIRECTIONS.map(|(dr, dc)| Line::extract(board, pos, player, dr, dc))
}

/// Number of distinct fours `player` would make by playing at `pos`
pub fn count_fours(board: &Board, pos: Pos, player: Player) -> usize {
    lines(board, pos, player).iter().map(|line| line.fours().len()).sum()
}

/// Number of lines in which `player` would make an open three at `pos`.
///
/// Lines that already hold a four are not counted, and neither are threes
/// whose only completions are also four completions.
pub fn count_open_threes(board: &Board, pos: Pos, player: Player) -> usize {
    let lines = lines(board, pos, player);
    let four_cells: HashSet<Pos> = lines
        .iter()
        .flat_map(|line| {
            line.fours()
                .into_iter()
                .filter_map(|four| line.cells[four.completion])
                .collect::<Vec<_>>()
        })
        .collect();

    lines
        .iter()
        .filter(|line| line.fours().is_empty())
        .filter(|line| {
            line.three_completions()
                .into_iter()
                .filter_map(|i| line.cells[i])
                .any(|cell| !four_cells.contains(&cell))
        })
        .count()
}

/// Check whether playing at `pos` is forbidden for `player`.
///
/// Returns `None` for every rule other than Renju and for O. The stone at
/// `pos` is treated as placed whether or not it already is.
pub fn forbidden_move(board: &Board, pos: Pos, player: Player, rule: GameRule) -> Option<Forbidden> {
    if !rule.restricts(player) {
        return None;
    }

    let lines = lines(board, pos, player);
    let runs: Vec<usize> = lines.iter().map(|line| line.run_len(CENTER)).collect();

    if runs.iter().any(|&len| len > 5) {
        return Some(Forbidden::Overline);
    }
    if runs.contains(&5) {
        return None;
    }
    if count_fours(board, pos, player) >= 2 {
        return Some(Forbidden::DoubleFour);
    }
    if count_open_threes(board, pos, player) >= 2 {
        return Some(Forbidden::DoubleThree);
    }
    None
}

/// Check if a move is valid: the cell is free and the move is not forbidden
pub fn is_valid_move(board: &Board, pos: Pos, player: Player, rule: GameRule) -> bool {
    board.is_empty(pos) && forbidden_move(board, pos, player, rule).is_none()
}
