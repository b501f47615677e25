//! Position and animation relay.

use chase_protocol::{AnimationState, PlayerId, Position, RoomCode, ServerEvent};

use crate::{Outbound, RoomService};

impl RoomService {
    /// Stores a player's reported transform and relays it to the rest of
    /// the room on the unreliable channel.
    ///
    /// Last write wins; nothing is interpolated or ordered by time. Reports
    /// from non-members and from caught players are dropped.
    pub fn update_position(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        position: Position,
        animation: AnimationState,
    ) -> Vec<Outbound> {
        let Some(stored) = self
            .store
            .get_mut(code)
            .and_then(|room| room.player_mut(player))
        else {
            return Vec::new();
        };
        if stored.caught {
            return Vec::new();
        }

        stored.position = position;
        stored.animation = animation;

        let others = self.members(code, Some(player));
        if others.is_empty() {
            return Vec::new();
        }
        vec![Outbound::unreliable(
            others,
            ServerEvent::PlayerMoved {
                id: player,
                position,
                animation_state: animation,
            },
        )]
    }
}
