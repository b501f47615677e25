//! What room operations want delivered, and to whom.
//!
//! Room operations never touch sockets. They return a list of
//! [`Outbound`] messages with the recipients already resolved against the
//! roster as it stood when the event happened; the lobby actor then fans
//! them out.

use chase_protocol::{Channel, PlayerId, ServerEvent};
use tokio::sync::mpsc;

/// A server event addressed to a concrete set of players.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Vec<PlayerId>,
    pub channel: Channel,
    pub event: ServerEvent,
}

impl Outbound {
    /// Reliable delivery to `to`.
    pub fn reliable(to: Vec<PlayerId>, event: ServerEvent) -> Self {
        Self {
            to,
            channel: Channel::ReliableOrdered,
            event,
        }
    }

    /// Best-effort delivery to `to`.
    pub fn unreliable(to: Vec<PlayerId>, event: ServerEvent) -> Self {
        Self {
            to,
            channel: Channel::Unreliable,
            event,
        }
    }
}

/// One event as it arrives in a connection's outbound queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub channel: Channel,
    pub event: ServerEvent,
}

/// Queue feeding one connection's writer.
pub type PlayerSender = mpsc::UnboundedSender<Outgoing>;
