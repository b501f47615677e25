//! Game events exchanged between clients and the relay server.
//!
//! Each enum is internally tagged on `"event"` with camelCase names, so a
//! create request is `{"event":"createRoom","requestId":1,"playerName":"Ada"}`.
//! Requests that expect an answer carry a client-chosen `requestId` that the
//! server echoes in its acknowledgment.

use serde::{Deserialize, Serialize};

use crate::{AnimationState, PlayerId, PlayerName, PlayerView, Position, RoomCode};

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Open a new room with the sender as creator and sole player.
    /// Answered by [`ServerEvent::RoomCreated`].
    CreateRoom {
        request_id: u32,
        player_name: PlayerName,
    },

    /// Join an existing room. Answered by [`ServerEvent::JoinResult`].
    JoinRoom {
        request_id: u32,
        room_code: RoomCode,
        player_name: PlayerName,
    },

    /// Creator only: pick a hunter and start the round.
    StartGame { room_code: RoomCode },

    /// Per-frame transform push.
    UpdatePosition {
        room_code: RoomCode,
        position: Position,
        animation_state: AnimationState,
    },

    /// Claim that `target` has been tagged.
    PlayerTagged {
        room_code: RoomCode,
        target: PlayerId,
    },
}

/// Who won the round. Only the hunter can win; the runners have no
/// escape condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Hunter,
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Acknowledges [`ClientEvent::CreateRoom`]. Sent to the creator only,
    /// always before the first roster broadcast.
    RoomCreated { request_id: u32, room_code: RoomCode },

    /// Acknowledges [`ClientEvent::JoinRoom`]. `room_code` is set on
    /// success, `message` on failure.
    JoinResult {
        request_id: u32,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_code: Option<RoomCode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Full roster of a room in join order.
    PlayerList { players: Vec<PlayerView> },

    /// The round started and `hunter` is it.
    GameStarted { hunter: PlayerId },

    /// Another player's latest transform.
    PlayerMoved {
        id: PlayerId,
        position: Position,
        animation_state: AnimationState,
    },

    /// `target` has been tagged.
    PlayerCaught { target: PlayerId },

    /// The round is over and the room is gone.
    GameOver { winner: Winner },
}
