//! Error types for the match engine
//!
//! Occupied cells and paused matches are not errors at the controller level
//! (they are ignored), but the board itself still reports them.

use std::path::PathBuf;

use crate::board::Pos;
use crate::engine::BridgeState;

/// Errors raised by board mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("cell {0} is already occupied")]
    Occupied(Pos),

    #[error("cell {0} is outside the board")]
    OutOfBounds(Pos),
}

/// Errors raised while launching or talking to an external engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine executable not found: {}", .0.display())]
    MissingExecutable(PathBuf),

    #[error("engine data file not found: {}", .0.display())]
    MissingDataFile(PathBuf),

    #[error("failed to start engine process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("engine pipe error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine answered '{got}' to {command}")]
    UnexpectedReply { command: String, got: String },

    #[error("engine session is {0:?}, cannot send {1}")]
    InvalidState(BridgeState, String),
}

/// Errors raised by the match controller
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("saved board is {saved_rows}x{saved_cols} but the match board is {rows}x{cols}")]
    SizeMismatch {
        saved_rows: usize,
        saved_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("saved cell {0} lies outside the board")]
    CellOutOfBounds(Pos),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
