//! Rooms for Chase: the authoritative side of the game.
//!
//! A single lobby actor owns every room and applies commands one at a time,
//! so each operation sees the store as the previous one left it.
//!
//! # Key types
//!
//! - [`RoomStore`]: rooms by code, plus which room each player is in
//! - [`RoomService`]: lifecycle, tag resolution and position relay over a store
//! - [`LobbyHandle`]: send commands to the running lobby actor
//! - [`RoomPhase`]: lobby or in progress
//! - [`RoomConfig`]: code length and spawn point

mod code;
mod config;
mod error;
mod lifecycle;
mod lobby;
mod outbound;
mod replication;
mod service;
mod store;
mod tags;

pub use code::generate_code;
pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use lobby::{LobbyHandle, spawn_lobby};
pub use outbound::{Outbound, Outgoing, PlayerSender};
pub use service::RoomService;
pub use store::{Player, Room, RoomSnapshot, RoomStore};
