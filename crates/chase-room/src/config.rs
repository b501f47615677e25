//! Room configuration and lifecycle phase.

use chase_protocol::Position;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room the service creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Number of characters in a generated room code.
    pub code_length: usize,

    /// Where a newly admitted player is placed until its first update.
    pub spawn_position: Position,
}

impl RoomConfig {
    /// Shortest code length accepted; 36^4 codes leaves ample room.
    pub const MIN_CODE_LENGTH: usize = 4;

    /// Raises a too-short `code_length` to [`Self::MIN_CODE_LENGTH`].
    pub fn validated(mut self) -> Self {
        if self.code_length < Self::MIN_CODE_LENGTH {
            tracing::warn!(
                code_length = self.code_length,
                min = Self::MIN_CODE_LENGTH,
                "room code length too short, clamping"
            );
            self.code_length = Self::MIN_CODE_LENGTH;
        }
        self
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            spawn_position: Position::new(0.0, 2.4, 0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its life.
///
/// ```text
/// Lobby ──(creator starts)──→ InProgress ──(hunter wins / empty)──→ removed
/// ```
///
/// There is no "finished" phase: a room that ends is removed from the
/// store in the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    /// Accepting joins; no hunter yet.
    Lobby,
    /// Round running; joins are refused.
    InProgress,
}

impl RoomPhase {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` once the creator has started the round.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InProgress => write!(f, "InProgress"),
        }
    }
}
