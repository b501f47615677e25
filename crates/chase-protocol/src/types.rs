//! Core protocol types for Chase's wire format.
//!
//! Every type here travels on the wire. Field names are camelCase on the
//! wire because the browser client reads them directly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ClientEvent, ProtocolError, ServerEvent};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identity of a player: the id of the connection it arrived on.
///
/// Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A short, human-typeable room code such as `"K3ZQ8A"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps an already well-formed code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Normalizes user input: surrounding whitespace is dropped and letters
    /// are upper-cased, so `" k3zq8a "` finds room `K3ZQ8A`.
    ///
    /// Returns `None` for blank input.
    pub fn normalize(input: &str) -> Option<Self> {
        let code = input.trim().to_ascii_uppercase();
        if code.is_empty() { None } else { Some(Self(code)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A display name: trimmed and never empty.
///
/// Decoding goes through [`PlayerName::parse`], so a blank name is refused
/// at the codec boundary instead of reaching the room store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    /// Trims `raw` and rejects it if nothing is left.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "player name must not be empty".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Transform and animation
// ---------------------------------------------------------------------------

/// A world-space position. `y` is up; the ground plane is `x`/`z`.
///
/// Coordinates are `f64` to match the browser's number type. Decoding goes
/// through [`Position::checked`], so a non-finite coordinate never reaches
/// the room store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WirePosition")]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Deserialize)]
struct WirePosition {
    x: f64,
    y: f64,
    z: f64,
}

impl TryFrom<WirePosition> for Position {
    type Error = ProtocolError;

    fn try_from(wire: WirePosition) -> Result<Self, Self::Error> {
        Self::checked(wire.x, wire.y, wire.z)
    }
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Like [`Position::new`], but refuses NaN and infinities.
    pub fn checked(x: f64, y: f64, z: f64) -> Result<Self, ProtocolError> {
        if [x, y, z].iter().all(|v| v.is_finite()) {
            Ok(Self { x, y, z })
        } else {
            Err(ProtocolError::InvalidMessage(
                "position coordinates must be finite".into(),
            ))
        }
    }

    /// Distance to `other` on the ground plane, ignoring height.
    pub fn planar_distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Distance from the world origin on the ground plane.
    pub fn planar_radius(&self) -> f64 {
        (self.x * self.x + self.z * self.z).sqrt()
    }
}

/// Client-reported animation flags. Advisory only: the server stores and
/// relays them verbatim, once the timers are known to be finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WireAnimationState")]
pub struct AnimationState {
    pub is_waving: bool,
    pub wave_time: f64,
    pub is_crouching: bool,
    pub crouch_amount: f64,
    pub is_moving: bool,
    pub animation_time: f64,
}

/// Decoded shape of [`AnimationState`]; older clients may omit fields.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnimationState {
    #[serde(default)]
    is_waving: bool,
    #[serde(default)]
    wave_time: f64,
    #[serde(default)]
    is_crouching: bool,
    #[serde(default)]
    crouch_amount: f64,
    #[serde(default)]
    is_moving: bool,
    #[serde(default)]
    animation_time: f64,
}

impl TryFrom<WireAnimationState> for AnimationState {
    type Error = ProtocolError;

    fn try_from(wire: WireAnimationState) -> Result<Self, Self::Error> {
        let timers = [wire.wave_time, wire.crouch_amount, wire.animation_time];
        if !timers.iter().all(|v| v.is_finite()) {
            return Err(ProtocolError::InvalidMessage(
                "animation timers must be finite".into(),
            ));
        }
        Ok(Self {
            is_waving: wire.is_waving,
            wave_time: wire.wave_time,
            is_crouching: wire.is_crouching,
            crouch_amount: wire.crouch_amount,
            is_moving: wire.is_moving,
            animation_time: wire.animation_time,
        })
    }
}

/// One row of a roster broadcast.
///
/// Animation fields are flattened into the row, matching the shape the
/// browser client already consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: PlayerName,
    pub position: Position,
    pub caught: bool,
    #[serde(flatten)]
    pub animation: AnimationState,
}

// ---------------------------------------------------------------------------
// Channel: delivery guarantees
// ---------------------------------------------------------------------------

/// The delivery guarantee requested for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    /// Delivered in order, no loss. Room commands, rosters, captures.
    #[default]
    ReliableOrdered,

    /// May be lost or reordered. Per-frame transforms, where only the
    /// latest value matters.
    Unreliable,
}

// ---------------------------------------------------------------------------
// SystemMessage: connection plumbing
// ---------------------------------------------------------------------------

/// Messages about the connection itself rather than the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: first frame on every connection.
    Handshake { version: u32 },

    /// Server → Client: the identity assigned to this connection.
    HandshakeAck {
        player_id: PlayerId,
        server_time: u64,
    },

    /// Either direction: "I'm disconnecting."
    Disconnect { reason: String },

    /// Server → Client: a request was malformed. `code` follows HTTP
    /// conventions (400 bad request).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload and Envelope
// ---------------------------------------------------------------------------

/// The content of an envelope.
///
/// Adjacently tagged:
/// `{ "type": "Client", "data": { "event": "startGame", "roomCode": "ABC123" } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    Client(ClientEvent),
    Server(ServerEvent),
}

/// The top-level wire frame. Every message on the socket is an `Envelope`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender sequence number.
    pub seq: u64,

    /// Milliseconds since the sender started.
    pub timestamp: u64,

    /// Defaults to `ReliableOrdered` when absent.
    #[serde(default)]
    pub channel: Channel,

    pub payload: Payload,
}
