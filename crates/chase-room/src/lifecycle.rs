//! Room lifecycle: create, join, start, leave.

use chase_protocol::{PlayerId, PlayerName, RoomCode, ServerEvent};
use rand::Rng;

use crate::store::{Player, Room};
use crate::{Outbound, RoomError, RoomPhase, RoomService};

impl RoomService {
    /// Opens a new room with `creator` as its creator and only player.
    ///
    /// Returns the new code and the roster broadcast. If the creator was
    /// sitting in another room it leaves that room first, which may emit
    /// a roster update there too.
    pub fn create_room(
        &mut self,
        creator: PlayerId,
        name: PlayerName,
    ) -> (RoomCode, Vec<Outbound>) {
        let mut out = self.leave_current_room(creator);

        let code = self.fresh_code();
        let player = Player::new(creator, name, self.config.spawn_position);
        if self.store.insert(Room::new(code.clone(), player)).is_err() {
            // Unreachable: the code is fresh and the creator was just evicted.
            tracing::error!(%code, %creator, "room store refused a fresh room");
        }
        tracing::info!(%code, %creator, "room created");

        out.extend(self.roster_broadcast(&code));
        (code, out)
    }

    /// Adds `player` to the room under `code`.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`]: no room with this code
    /// - [`RoomError::GameAlreadyStarted`]: the round is running
    pub fn join_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        name: PlayerName,
    ) -> Result<(RoomCode, Vec<Outbound>), RoomError> {
        let room = self
            .store
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if !room.phase.is_joinable() {
            return Err(RoomError::GameAlreadyStarted(code.clone()));
        }
        if room.contains(player) {
            tracing::debug!(%code, %player, "join for a room the player is already in");
            return Ok((code.clone(), self.roster_broadcast(code).into_iter().collect()));
        }

        let mut out = self.leave_current_room(player);

        let admitted = Player::new(player, name, self.config.spawn_position);
        if self.store.admit(code, admitted).is_err() {
            tracing::error!(%code, %player, "room store refused an admission");
        }
        tracing::info!(
            %code,
            %player,
            players = self.store.get(code).map_or(0, |r| r.players.len()),
            "player joined"
        );

        out.extend(self.roster_broadcast(code));
        Ok((code.clone(), out))
    }

    /// Starts the round: draws a hunter uniformly from the roster.
    ///
    /// Silently does nothing unless `caller` created the room and the
    /// round has not started yet.
    pub fn start_game(&mut self, caller: PlayerId, code: &RoomCode) -> Vec<Outbound> {
        let Some(room) = self.store.get_mut(code) else {
            tracing::debug!(%code, %caller, "start for unknown room ignored");
            return Vec::new();
        };
        if room.creator != caller || room.phase.is_started() {
            tracing::debug!(%code, %caller, phase = %room.phase, "start ignored");
            return Vec::new();
        }

        let index = self.rng.random_range(0..room.players.len());
        let hunter = room.players[index].id;
        room.hunter = Some(hunter);
        room.phase = RoomPhase::InProgress;
        tracing::info!(%code, %hunter, players = room.players.len(), "game started");

        let mut out = vec![Outbound::reliable(
            room.member_ids(),
            ServerEvent::GameStarted { hunter },
        )];
        out.extend(self.roster_broadcast(code));
        out
    }

    /// Removes a departed connection from its room.
    ///
    /// The remaining members get the new roster; an emptied room is
    /// destroyed. Unknown players are ignored.
    ///
    /// The hunter's win condition is not evaluated here, only on a tag
    /// claim, so a runner leaving never ends the round by itself.
    pub fn handle_disconnect(&mut self, player: PlayerId) -> Vec<Outbound> {
        self.leave_current_room(player)
    }

    fn leave_current_room(&mut self, player: PlayerId) -> Vec<Outbound> {
        let Some(code) = self.store.evict(player) else {
            return Vec::new();
        };
        let remaining = self.store.get(&code).map_or(0, |r| r.players.len());
        tracing::info!(%code, %player, players = remaining, "player left");

        if remaining == 0 {
            self.store.remove(&code);
            tracing::info!(%code, "room destroyed (empty)");
            return Vec::new();
        }
        self.roster_broadcast(&code).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use chase_protocol::{Channel, Position};

    use super::*;
    use crate::RoomConfig;

    fn service() -> RoomService {
        RoomService::with_seed(RoomConfig::default(), 42)
    }

    fn name(s: &str) -> PlayerName {
        PlayerName::parse(s).unwrap()
    }

    fn roster_ids(out: &Outbound) -> Vec<PlayerId> {
        match &out.event {
            ServerEvent::PlayerList { players } => players.iter().map(|p| p.id).collect(),
            other => panic!("expected PlayerList, got {other:?}"),
        }
    }

    #[test]
    fn test_create_room_registers_creator_and_broadcasts_roster() {
        let mut svc = service();
        let (code, out) = svc.create_room(PlayerId(1), name("Ada"));

        assert_eq!(code.as_str().len(), 6);
        let snap = svc.snapshot(&code).unwrap();
        assert_eq!(snap.creator, PlayerId(1));
        assert_eq!(snap.phase, RoomPhase::Lobby);
        assert_eq!(snap.hunter, None);
        assert_eq!(snap.players[0].position, Position::new(0.0, 2.4, 0.0));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, vec![PlayerId(1)]);
        assert_eq!(out[0].channel, Channel::ReliableOrdered);
        assert_eq!(roster_ids(&out[0]), vec![PlayerId(1)]);
    }

    #[test]
    fn test_join_unknown_code_fails_with_not_found() {
        let mut svc = service();
        let err = svc
            .join_room(PlayerId(2), &RoomCode::new("NOPE00"), name("Bo"))
            .unwrap_err();
        assert_eq!(err, RoomError::NotFound(RoomCode::new("NOPE00")));
        assert_eq!(err.to_string(), "Invalid room code");
    }

    #[test]
    fn test_join_started_room_fails() {
        let mut svc = service();
        let (code, _) = svc.create_room(PlayerId(1), name("Ada"));
        svc.start_game(PlayerId(1), &code);

        let err = svc.join_room(PlayerId(2), &code, name("Bo")).unwrap_err();
        assert_eq!(err, RoomError::GameAlreadyStarted(code.clone()));
        assert_eq!(err.to_string(), "Game already started");
        assert_eq!(svc.snapshot(&code).unwrap().players.len(), 1);
    }

    #[test]
    fn test_join_broadcasts_roster_to_everyone_in_join_order() {
        let mut svc = service();
        let (code, _) = svc.create_room(PlayerId(1), name("Ada"));
        svc.join_room(PlayerId(2), &code, name("Bo")).unwrap();
        let (joined, out) = svc.join_room(PlayerId(3), &code, name("Cy")).unwrap();

        assert_eq!(joined, code);
        let last = out.last().unwrap();
        assert_eq!(last.to, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
        assert_eq!(roster_ids(last), vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn test_rejoining_same_room_does_not_duplicate_player() {
        let mut svc = service();
        let (code, _) = svc.create_room(PlayerId(1), name("Ada"));
        svc.join_room(PlayerId(2), &code, name("Bo")).unwrap();
        svc.join_room(PlayerId(2), &code, name("Bo")).unwrap();
        assert_eq!(svc.snapshot(&code).unwrap().players.len(), 2);
    }

    #[test]
    fn test_joining_another_room_leaves_the_first() {
        let mut svc = service();
        let (first, _) = svc.create_room(PlayerId(1), name("Ada"));
        svc.join_room(PlayerId(2), &first, name("Bo")).unwrap();
        let (second, _) = svc.create_room(PlayerId(3), name("Cy"));

        let (_, out) = svc.join_room(PlayerId(2), &second, name("Bo")).unwrap();

        // One roster for the room Bo left, one for the room Bo entered.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].to, vec![PlayerId(1)]);
        assert_eq!(svc.snapshot(&first).unwrap().players.len(), 1);
        assert_eq!(svc.store().room_of(PlayerId(2)), Some(&second));
    }

    #[test]
    fn test_start_game_by_non_creator_is_ignored() {
        let mut svc = service();
        let (code, _) = svc.create_room(PlayerId(1), name("Ada"));
        svc.join_room(PlayerId(2), &code, name("Bo")).unwrap();

        assert!(svc.start_game(PlayerId(2), &code).is_empty());
        assert_eq!(svc.snapshot(&code).unwrap().phase, RoomPhase::Lobby);
    }

    #[test]
    fn test_start_game_picks_member_as_hunter_then_sends_roster() {
        let mut svc = service();
        let (code, _) = svc.create_room(PlayerId(1), name("Ada"));
        svc.join_room(PlayerId(2), &code, name("Bo")).unwrap();
        svc.join_room(PlayerId(3), &code, name("Cy")).unwrap();

        let out = svc.start_game(PlayerId(1), &code);
        assert_eq!(out.len(), 2);
        let hunter = match out[0].event {
            ServerEvent::GameStarted { hunter } => hunter,
            ref other => panic!("expected GameStarted, got {other:?}"),
        };
        assert!([PlayerId(1), PlayerId(2), PlayerId(3)].contains(&hunter));
        assert!(matches!(out[1].event, ServerEvent::PlayerList { .. }));

        let snap = svc.snapshot(&code).unwrap();
        assert_eq!(snap.hunter, Some(hunter));
        assert_eq!(snap.phase, RoomPhase::InProgress);
    }

    #[test]
    fn test_start_game_twice_is_ignored() {
        let mut svc = service();
        let (code, _) = svc.create_room(PlayerId(1), name("Ada"));
        assert_eq!(svc.start_game(PlayerId(1), &code).len(), 2);
        assert!(svc.start_game(PlayerId(1), &code).is_empty());
    }

    #[test]
    fn test_hunter_draw_covers_every_player() {
        // Uniform draw: over many rooms each seat should come up.
        let mut svc = service();
        let mut seen = std::collections::HashSet::new();
        for round in 0..200u64 {
            let base = round * 10;
            let (code, _) = svc.create_room(PlayerId(base + 1), name("a"));
            svc.join_room(PlayerId(base + 2), &code, name("b")).unwrap();
            svc.join_room(PlayerId(base + 3), &code, name("c")).unwrap();
            svc.start_game(PlayerId(base + 1), &code);
            let hunter = svc.snapshot(&code).unwrap().hunter.unwrap();
            seen.insert(hunter.0 - base);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_disconnect_broadcasts_roster_to_remaining() {
        let mut svc = service();
        let (code, _) = svc.create_room(PlayerId(1), name("Ada"));
        svc.join_room(PlayerId(2), &code, name("Bo")).unwrap();

        let out = svc.handle_disconnect(PlayerId(1));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, vec![PlayerId(2)]);
        assert_eq!(roster_ids(&out[0]), vec![PlayerId(2)]);
    }

    #[test]
    fn test_last_disconnect_destroys_room() {
        let mut svc = service();
        let (code, _) = svc.create_room(PlayerId(1), name("Ada"));

        assert!(svc.handle_disconnect(PlayerId(1)).is_empty());
        assert!(svc.snapshot(&code).is_none());
        assert_eq!(svc.room_count(), 0);
    }

    #[test]
    fn test_disconnect_of_unknown_player_is_noop() {
        let mut svc = service();
        svc.create_room(PlayerId(1), name("Ada"));
        assert!(svc.handle_disconnect(PlayerId(99)).is_empty());
        assert_eq!(svc.room_count(), 1);
    }
}
