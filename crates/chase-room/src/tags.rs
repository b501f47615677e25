//! Tag resolution.
//!
//! Claims are trusted: any member may claim any target, and proximity is
//! never recomputed here. The only guard is that a target is caught once.

use chase_protocol::{PlayerId, RoomCode, ServerEvent, Winner};

use crate::{Outbound, RoomService};

impl RoomService {
    /// Marks `target` caught in `code`.
    ///
    /// Broadcasts `PlayerCaught` to the room. If that leaves no uncaught
    /// runner, `GameOver` follows and the room is destroyed. Claims for an
    /// unknown room or player, or for a target already caught, do nothing.
    pub fn claim_tag(
        &mut self,
        claimant: PlayerId,
        code: &RoomCode,
        target: PlayerId,
    ) -> Vec<Outbound> {
        let Some(room) = self.store.get_mut(code) else {
            tracing::debug!(%code, %claimant, %target, "tag for unknown room ignored");
            return Vec::new();
        };
        let Some(player) = room.player_mut(target) else {
            tracing::debug!(%code, %claimant, %target, "tag for non-member ignored");
            return Vec::new();
        };
        if player.caught {
            tracing::debug!(%code, %claimant, %target, "duplicate tag ignored");
            return Vec::new();
        }

        player.caught = true;
        tracing::info!(%code, %claimant, %target, "player caught");

        let members = room.member_ids();
        let mut out = vec![Outbound::reliable(
            members.clone(),
            ServerEvent::PlayerCaught { target },
        )];

        if room.all_runners_caught() {
            out.push(Outbound::reliable(
                members,
                ServerEvent::GameOver {
                    winner: Winner::Hunter,
                },
            ));
            self.store.remove(code);
            tracing::info!(%code, "game over, hunter wins");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use chase_protocol::PlayerName;

    use super::*;
    use crate::{RoomConfig, RoomError};

    /// A started three-player room with the hunter fixed to player 1.
    fn started_room() -> (RoomService, RoomCode) {
        let mut svc = RoomService::with_seed(RoomConfig::default(), 7);
        let (code, _) = svc.create_room(PlayerId(1), PlayerName::parse("Hank").unwrap());
        svc.join_room(PlayerId(2), &code, PlayerName::parse("Bo").unwrap())
            .unwrap();
        svc.join_room(PlayerId(3), &code, PlayerName::parse("Cy").unwrap())
            .unwrap();
        svc.start_game(PlayerId(1), &code);
        svc.store.get_mut(&code).unwrap().hunter = Some(PlayerId(1));
        (svc, code)
    }

    fn caught_targets(out: &[Outbound]) -> Vec<PlayerId> {
        out.iter()
            .filter_map(|o| match o.event {
                ServerEvent::PlayerCaught { target } => Some(target),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_claim_marks_target_and_broadcasts_once() {
        let (mut svc, code) = started_room();

        let out = svc.claim_tag(PlayerId(1), &code, PlayerId(2));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
        assert_eq!(caught_targets(&out), vec![PlayerId(2)]);

        let snap = svc.snapshot(&code).unwrap();
        assert!(snap.players[1].caught);
        assert!(!snap.players[2].caught);
    }

    #[test]
    fn test_duplicate_claim_is_noop() {
        let (mut svc, code) = started_room();
        svc.claim_tag(PlayerId(1), &code, PlayerId(2));

        assert!(svc.claim_tag(PlayerId(1), &code, PlayerId(2)).is_empty());
        // A self-report arriving after the hunter's claim is a duplicate too.
        assert!(svc.claim_tag(PlayerId(2), &code, PlayerId(2)).is_empty());
    }

    #[test]
    fn test_last_runner_caught_ends_game_and_removes_room() {
        let (mut svc, code) = started_room();
        svc.claim_tag(PlayerId(1), &code, PlayerId(2));

        let out = svc.claim_tag(PlayerId(3), &code, PlayerId(3));
        assert_eq!(out.len(), 2);
        assert_eq!(caught_targets(&out), vec![PlayerId(3)]);
        assert_eq!(
            out[1].event,
            ServerEvent::GameOver {
                winner: Winner::Hunter
            }
        );
        assert_eq!(out[1].to.len(), 3);

        assert!(svc.snapshot(&code).is_none());
        assert!(svc.store().room_of(PlayerId(1)).is_none());
        let err = svc
            .join_room(PlayerId(4), &code, PlayerName::parse("Late").unwrap())
            .unwrap_err();
        assert!(matches!(err, RoomError::NotFound(_)));
    }

    #[test]
    fn test_claim_after_game_over_has_no_effect() {
        let (mut svc, code) = started_room();
        svc.claim_tag(PlayerId(1), &code, PlayerId(2));
        svc.claim_tag(PlayerId(1), &code, PlayerId(3));

        assert!(svc.claim_tag(PlayerId(1), &code, PlayerId(3)).is_empty());
        assert_eq!(svc.room_count(), 0);
    }

    #[test]
    fn test_claim_for_non_member_is_noop() {
        let (mut svc, code) = started_room();
        assert!(svc.claim_tag(PlayerId(1), &code, PlayerId(42)).is_empty());
        assert!(
            svc.claim_tag(PlayerId(1), &RoomCode::new("ZZZZZZ"), PlayerId(2))
                .is_empty()
        );
    }

    #[test]
    fn test_runner_leaving_does_not_end_game() {
        let (mut svc, code) = started_room();
        svc.claim_tag(PlayerId(1), &code, PlayerId(2));

        // Player 3 was the last runner; leaving is not a catch.
        svc.handle_disconnect(PlayerId(3));
        let snap = svc.snapshot(&code).unwrap();
        assert_eq!(snap.players.len(), 2);
        assert_eq!(snap.phase, crate::RoomPhase::InProgress);
    }

    #[test]
    fn test_hunter_leaving_requires_every_remaining_player_caught() {
        let (mut svc, code) = started_room();
        svc.handle_disconnect(PlayerId(1));

        let out = svc.claim_tag(PlayerId(2), &code, PlayerId(2));
        assert_eq!(out.len(), 1);
        let out = svc.claim_tag(PlayerId(3), &code, PlayerId(3));
        assert_eq!(out.len(), 2);
        assert!(svc.snapshot(&code).is_none());
    }
}
