//! Caro match engine
//!
//! Rules, move selection and match orchestration for five-in-a-row games:
//! - Freestyle: five or more in a row wins, the board grows near its edges
//! - Standard: exactly five wins
//! - Renju: X needs exactly five and may not play overlines, double-fours
//!   or double-threes; O plays freestyle
//!
//! # Architecture
//!
//! - [`board`]: growable grid with an incrementally maintained candidate set
//! - [`rules`]: win detection and Renju forbidden moves
//! - [`eval`]: single-ply heuristic AI (Easy and Hard tiers)
//! - [`engine`]: client for external engines speaking the line protocol
//! - [`game`]: match controller, observer callbacks and saved matches
//! - [`config`]: match configuration
//!
//! # Quick Start
//!
//! ```
//! use caro::{Board, GameRule, Player, Pos};
//!
//! let mut board = Board::new(15, 15);
//! for col in 3..8 {
//!     board.place(Pos::new(7, col), Player::X).unwrap();
//! }
//! assert!(caro::rules::is_win(&board, Pos::new(7, 5), GameRule::Standard));
//!
//! // Hard AI reply for O
//! let reply = caro::eval::hard_move(&board, Player::O, GameRule::Standard);
//! assert!(reply.is_some());
//! ```

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod game;
pub mod rules;

// Re-export commonly used types
pub use board::{Board, Cell, Player, Pos};
pub use config::{GameMode, MatchConfig};
pub use error::{BoardError, ConfigError, EngineError, MatchError};
pub use eval::AiTier;
pub use game::{GameEnd, MatchController, MatchObserver, MatchSnapshot, MoveOutcome};
pub use rules::GameRule;
