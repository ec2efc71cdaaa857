//! Local move selection
//!
//! Single-ply heuristics used when no external engine is playing:
//! - [`heuristic`]: Easy and Hard move selectors
//! - [`patterns`]: scoring table for simulated runs

pub mod heuristic;
pub mod patterns;

pub use heuristic::{easy_move, hard_move, line_potential, score_cell, select_move, AiTier};
pub use patterns::{line_score, PatternScore};
