//! Error types for the room layer.

use chase_protocol::RoomCode;

/// Errors a room operation can surface to its caller.
///
/// Only the join path reports failures to players; the `Display` text of
/// those variants is what the join acknowledgment shows. Every other
/// rejected operation is a silent no-op and never becomes a `RoomError`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room is registered under this code.
    #[error("Invalid room code")]
    NotFound(RoomCode),

    /// The room exists but its round has already started.
    #[error("Game already started")]
    GameAlreadyStarted(RoomCode),

    /// The lobby actor is gone (server shutting down).
    #[error("lobby is unavailable")]
    Unavailable,
}
