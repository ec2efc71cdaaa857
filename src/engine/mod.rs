//! Client side of the line-oriented engine protocol
//!
//! - [`protocol`]: command lines and reply classification
//! - [`session`]: request/response state machine over any pipe pair
//! - [`bridge`]: the engine subprocess and its lifecycle

pub mod bridge;
pub mod protocol;
pub mod session;

pub use bridge::EngineBridge;
pub use protocol::{read_reply, Command, EngineMoveResult, EngineReply};
pub use session::{BridgeState, Session};
