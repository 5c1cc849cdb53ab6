//! Room Error Taxonomy
//!
//! Recoverable, per-client failures. Anything here is reported back to the
//! offending client as an `Error` event; it never tears down the room.

use thiserror::Error;

use crate::game::state::RoomId;

/// Failures of room-level operations.
#[derive(Debug, Error, PartialEq)]
pub enum RoomError {
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("room {0} is full")]
    RoomFull(RoomId),

    #[error("only the host can do that")]
    Unauthorized,

    #[error("you are not in a room")]
    NotInRoom,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Best-effort events outside the acceptance window are dropped
    /// silently; this only ever reaches a debug log.
    #[error("event timestamp outside acceptance window ({skew_ms} ms skew)")]
    StaleEvent { skew_ms: u64 },
}
