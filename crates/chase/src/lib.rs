//! # Chase
//!
//! Relay server for a multiplayer tag game.
//!
//! Clients connect over WebSocket, create or join rooms by code, and push
//! their transforms every frame. The server owns the rooms: it keeps the
//! roster, picks the hunter, resolves tag claims and decides when the round
//! is over. Positions are trusted as reported and fanned out to the other
//! members of the room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chase::ChaseServer;
//!
//! # async fn demo() -> Result<(), chase::ChaseError> {
//! let server = ChaseServer::builder().bind("0.0.0.0:3000").build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::ChaseError;
pub use server::{ChaseServer, ChaseServerBuilder};

/// Re-exports for embedding the server and talking to it.
pub mod prelude {
    pub use crate::{ChaseError, ChaseServer, ChaseServerBuilder, ServerConfig};
    pub use chase_protocol::{
        AnimationState, Channel, ClientEvent, Codec, Envelope, JsonCodec, PROTOCOL_VERSION,
        Payload, PlayerId, PlayerName, PlayerView, Position, RoomCode, ServerEvent, SystemMessage,
        Winner,
    };
    pub use chase_room::{RoomConfig, RoomError, RoomPhase};
}
