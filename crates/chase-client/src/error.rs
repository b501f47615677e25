//! Error types for the client.

use chase_protocol::ProtocolError;
use chase_transport::TransportError;

/// Errors surfaced by the client link and driver.
///
/// Refused joins are expected outcomes; their text is the server's message
/// and is meant to be shown to the player as-is.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Please enter a name")]
    EmptyName,

    #[error("Please enter name and room code")]
    MissingJoinDetails,

    #[error("Only the room creator can start the game!")]
    NotCreator,

    /// The session has no room to act on yet.
    #[error("not in a room")]
    NotInRoom,

    /// The server answered a join with `success: false`.
    #[error("{0}")]
    JoinRefused(String),

    /// The server refused the handshake with an error frame.
    #[error("server error {code}: {message}")]
    Server { code: u16, message: String },

    /// A frame arrived that makes no sense at this point of the exchange.
    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
