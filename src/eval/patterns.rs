//! Pattern scores for the heuristic selector
//!
//! A candidate cell is scored by the runs it would extend. These weights
//! are fixed; changing them changes which move the Hard tier picks.

/// Pattern scores keyed by simulated run length
pub struct PatternScore;

impl PatternScore {
    /// Five or more in a row
    pub const FIVE: i32 = 10_000;
    pub const FOUR: i32 = 1_000;
    pub const THREE: i32 = 100;
    pub const TWO: i32 = 10;
}

/// Multiplier for the mover's own line potential
pub const OWN_WEIGHT: i32 = 2;
/// Multiplier for the opponent's line potential (blocking value)
pub const OPPONENT_WEIGHT: i32 = 1;
/// Bonus per opponent stone touching the candidate
pub const ADJACENCY_WEIGHT: i32 = 5;

/// Score for a run of `len` stones that a placement would produce
#[inline]
pub fn line_score(len: usize) -> i32 {
    match len {
        0 | 1 => 0,
        2 => PatternScore::TWO,
        3 => PatternScore::THREE,
        4 => PatternScore::FOUR,
        _ => PatternScore::FIVE,
    }
}
