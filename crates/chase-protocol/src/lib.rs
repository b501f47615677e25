//! Wire protocol for Chase.
//!
//! - **Types** ([`Envelope`], [`Payload`], [`PlayerView`], ...): the frames
//!   that travel over the socket.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): one tagged variant per
//!   named game event, each with an explicit schema.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, typed values out.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room service (events)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent, Winner};
pub use types::{
    AnimationState, Channel, Envelope, Payload, PlayerId, PlayerName, PlayerView, Position,
    RoomCode, SystemMessage,
};

/// Version a client must announce in its handshake.
pub const PROTOCOL_VERSION: u32 = 1;
