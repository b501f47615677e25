//! Client session controller.
//!
//! Holds one client's view of its room: who is in it, where the other
//! players are, who the hunter is, and the local avatar. Server events are
//! folded in with [`ClientSession::apply`]; each frame, [`ClientSession::step`]
//! moves the avatar and returns what to send.
//!
//! The session does no I/O. Effects that a renderer or UI would show are
//! returned as [`SessionEffect`] values.

use std::collections::BTreeMap;

use chase_protocol::{
    AnimationState, ClientEvent, PlayerId, PlayerView, Position, RoomCode, ServerEvent, Winner,
};

use crate::avatar::{Avatar, animate};
use crate::{ClientConfig, ClientError, InputState, MovementConfig, World};

/// Text shown when the local player is tagged.
pub const CAUGHT_NOTICE: &str = "You have been caught!";

/// Where this client is in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not in a room yet.
    Menu,
    /// In a room, waiting for the creator to start.
    Lobby,
    /// Round running; frames produce updates.
    Playing,
    /// `gameOver` received; the session is finished.
    Over,
}

/// Local stand-in for another player.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteProxy {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub animation: AnimationState,
    pub caught: bool,
    /// Drawn in the hunter/caught colour.
    pub marked: bool,
}

impl RemoteProxy {
    fn from_view(view: &PlayerView, marked: bool) -> Self {
        Self {
            id: view.id,
            name: view.name.to_string(),
            position: view.position,
            animation: view.animation,
            caught: view.caught,
            marked,
        }
    }
}

/// Something the embedding UI should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    RoomEntered { code: RoomCode, creator: bool },
    /// A join was refused; `message` is for the player.
    JoinFailed { message: String },
    /// Lobby list of names, in join order.
    RosterChanged { names: Vec<String> },
    ProxySpawned(PlayerId),
    ProxyDespawned(PlayerId),
    /// Apply the hunter/caught marker to a proxy.
    ProxyMarked(PlayerId),
    /// Transient message; control is not interrupted.
    Notify(String),
    GameStarted { hunter: PlayerId, is_hunter: bool },
    GameOver { winner: Winner },
}

pub struct ClientSession {
    local_id: PlayerId,
    phase: SessionPhase,
    room_code: Option<RoomCode>,
    is_creator: bool,
    hunter: Option<PlayerId>,
    roster: Vec<String>,
    proxies: BTreeMap<PlayerId, RemoteProxy>,
    avatar: Avatar,
    /// Set once a capture naming the local player arrives.
    self_caught: bool,
    world: World,
    tag_distance: f64,
    movement: MovementConfig,
}

impl ClientSession {
    /// A session on the standard island with a randomly placed avatar.
    pub fn new(local_id: PlayerId, config: &ClientConfig) -> Self {
        Self {
            local_id,
            phase: SessionPhase::Menu,
            room_code: None,
            is_creator: false,
            hunter: None,
            roster: Vec::new(),
            proxies: BTreeMap::new(),
            avatar: Avatar::spawn(&mut rand::rng(), &config.movement),
            self_caught: false,
            world: World::island(&config.world),
            tag_distance: config.world.tag_distance,
            movement: config.movement.clone(),
        }
    }

    pub fn with_world(mut self, world: World) -> Self {
        self.world = world;
        self
    }

    pub fn with_avatar(mut self, avatar: Avatar) -> Self {
        self.avatar = avatar;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn local_id(&self) -> PlayerId {
        self.local_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room_code.as_ref()
    }

    pub fn is_creator(&self) -> bool {
        self.is_creator
    }

    pub fn hunter(&self) -> Option<PlayerId> {
        self.hunter
    }

    pub fn is_hunter(&self) -> bool {
        self.hunter == Some(self.local_id)
    }

    pub fn is_self_caught(&self) -> bool {
        self.self_caught
    }

    /// Names from the latest roster, in join order.
    pub fn roster_names(&self) -> &[String] {
        &self.roster
    }

    pub fn proxies(&self) -> impl Iterator<Item = &RemoteProxy> {
        self.proxies.values()
    }

    pub fn proxy(&self, id: PlayerId) -> Option<&RemoteProxy> {
        self.proxies.get(&id)
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// The start request, if this client may send one.
    pub fn start_game_request(&self) -> Result<ClientEvent, ClientError> {
        let room_code = self.room_code.clone().ok_or(ClientError::NotInRoom)?;
        if !self.is_creator {
            return Err(ClientError::NotCreator);
        }
        Ok(ClientEvent::StartGame { room_code })
    }

    // -----------------------------------------------------------------------
    // Incoming
    // -----------------------------------------------------------------------

    /// Folds one server event into the local view.
    pub fn apply(&mut self, event: ServerEvent) -> Vec<SessionEffect> {
        match event {
            ServerEvent::RoomCreated { room_code, .. } => self.enter_room(room_code, true),
            ServerEvent::JoinResult {
                success: true,
                room_code: Some(room_code),
                ..
            } => self.enter_room(room_code, false),
            ServerEvent::JoinResult { message, .. } => vec![SessionEffect::JoinFailed {
                message: message.unwrap_or_else(|| "Join failed".to_string()),
            }],
            ServerEvent::PlayerList { players } => self.reconcile(&players),
            ServerEvent::GameStarted { hunter } => self.start(hunter),
            ServerEvent::PlayerMoved {
                id,
                position,
                animation_state,
            } => {
                if let Some(proxy) = self.proxies.get_mut(&id) {
                    proxy.position = position;
                    proxy.animation = animation_state;
                }
                Vec::new()
            }
            ServerEvent::PlayerCaught { target } => self.caught(target),
            ServerEvent::GameOver { winner } => {
                self.phase = SessionPhase::Over;
                tracing::info!(local = %self.local_id, ?winner, "game over");
                vec![SessionEffect::GameOver { winner }]
            }
        }
    }

    fn enter_room(&mut self, code: RoomCode, creator: bool) -> Vec<SessionEffect> {
        tracing::debug!(local = %self.local_id, %code, creator, "entered room");
        self.room_code = Some(code.clone());
        self.is_creator = creator;
        self.phase = SessionPhase::Lobby;
        vec![SessionEffect::RoomEntered { code, creator }]
    }

    /// Full-roster diff against the mirrored proxies.
    fn reconcile(&mut self, players: &[PlayerView]) -> Vec<SessionEffect> {
        let mut effects = Vec::new();

        for view in players.iter().filter(|v| v.id != self.local_id) {
            match self.proxies.get_mut(&view.id) {
                Some(proxy) => {
                    proxy.position = view.position;
                    proxy.animation = view.animation;
                    // Caught never reverts; a stale roster may still say otherwise.
                    proxy.caught |= view.caught;
                }
                None => {
                    let marked = Some(view.id) == self.hunter;
                    self.proxies
                        .insert(view.id, RemoteProxy::from_view(view, marked));
                    effects.push(SessionEffect::ProxySpawned(view.id));
                }
            }
        }

        let gone: Vec<PlayerId> = self
            .proxies
            .keys()
            .filter(|id| !players.iter().any(|v| v.id == **id))
            .copied()
            .collect();
        for id in gone {
            self.proxies.remove(&id);
            effects.push(SessionEffect::ProxyDespawned(id));
        }

        let names: Vec<String> = players.iter().map(|v| v.name.to_string()).collect();
        if names != self.roster {
            self.roster = names.clone();
            effects.push(SessionEffect::RosterChanged { names });
        }
        effects
    }

    fn start(&mut self, hunter: PlayerId) -> Vec<SessionEffect> {
        self.hunter = Some(hunter);
        self.phase = SessionPhase::Playing;
        let is_hunter = self.is_hunter();
        tracing::info!(local = %self.local_id, %hunter, is_hunter, "game started");

        let mut effects = vec![SessionEffect::GameStarted { hunter, is_hunter }];
        if let Some(proxy) = self.proxies.get_mut(&hunter) {
            proxy.marked = true;
            effects.push(SessionEffect::ProxyMarked(hunter));
        }
        effects
    }

    fn caught(&mut self, target: PlayerId) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        if let Some(proxy) = self.proxies.get_mut(&target) {
            proxy.caught = true;
            proxy.marked = true;
            effects.push(SessionEffect::ProxyMarked(target));
        }
        if target == self.local_id {
            self.self_caught = true;
            effects.push(SessionEffect::Notify(CAUGHT_NOTICE.to_string()));
        }
        effects
    }

    // -----------------------------------------------------------------------
    // Outgoing
    // -----------------------------------------------------------------------

    /// Runs one local frame and returns the events to send.
    ///
    /// Only while playing. The transform is reported every frame, moved or
    /// not, followed by any tag claims for proxies in reach.
    pub fn step(&mut self, input: &InputState) -> Vec<ClientEvent> {
        if self.phase != SessionPhase::Playing {
            return Vec::new();
        }
        let Some(room_code) = self.room_code.clone() else {
            return Vec::new();
        };

        self.avatar
            .turn_camera(input, self.movement.camera_sensitivity);
        self.avatar.apply_actions(input);
        self.avatar.try_move(input, &self.movement, &self.world);

        let mut out = vec![ClientEvent::UpdatePosition {
            room_code: room_code.clone(),
            position: self.avatar.position,
            animation_state: self.avatar.animation,
        }];
        out.extend(
            self.tag_claims()
                .into_iter()
                .map(|target| ClientEvent::PlayerTagged {
                    room_code: room_code.clone(),
                    target,
                }),
        );

        animate(&mut self.avatar.animation);
        for proxy in self.proxies.values_mut() {
            animate(&mut proxy.animation);
        }
        out
    }

    /// Targets to claim this frame.
    ///
    /// The hunter claims every uncaught proxy in reach. A runner in reach of
    /// the hunter claims itself, unless it already knows it was caught.
    fn tag_claims(&self) -> Vec<PlayerId> {
        let me = self.avatar.position;
        let mut in_reach = self
            .proxies
            .values()
            .filter(|p| !p.caught && me.planar_distance(&p.position) < self.tag_distance);

        if self.is_hunter() {
            in_reach.map(|p| p.id).collect()
        } else if !self.self_caught && in_reach.any(|p| Some(p.id) == self.hunter) {
            vec![self.local_id]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use chase_protocol::PlayerName;

    use super::*;
    use crate::WorldConfig;

    const ME: PlayerId = PlayerId(1);

    fn session() -> ClientSession {
        let config = ClientConfig::default();
        ClientSession::new(ME, &config)
            .with_world(World::open(&WorldConfig::default()))
            .with_avatar(Avatar::new(Position::new(0.0, 2.4, 0.0)))
    }

    fn view(id: u64, name: &str, x: f64) -> PlayerView {
        PlayerView {
            id: PlayerId(id),
            name: PlayerName::parse(name).unwrap(),
            position: Position::new(x, 2.4, 0.0),
            caught: false,
            animation: AnimationState::default(),
        }
    }

    fn roster(views: Vec<PlayerView>) -> ServerEvent {
        ServerEvent::PlayerList { players: views }
    }

    fn playing(hunter: u64, others: Vec<PlayerView>) -> ClientSession {
        let mut s = session();
        s.apply(ServerEvent::JoinResult {
            request_id: 1,
            success: true,
            room_code: Some(RoomCode::new("ABC123")),
            message: None,
        });
        let mut views = vec![view(1, "Me", 0.0)];
        views.extend(others);
        s.apply(roster(views));
        s.apply(ServerEvent::GameStarted {
            hunter: PlayerId(hunter),
        });
        s
    }

    fn claims(events: &[ClientEvent]) -> Vec<PlayerId> {
        events
            .iter()
            .filter_map(|e| match e {
                ClientEvent::PlayerTagged { target, .. } => Some(*target),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_room_created_makes_creator() {
        let mut s = session();
        let effects = s.apply(ServerEvent::RoomCreated {
            request_id: 1,
            room_code: RoomCode::new("K3ZQ8A"),
        });
        assert_eq!(
            effects,
            vec![SessionEffect::RoomEntered {
                code: RoomCode::new("K3ZQ8A"),
                creator: true
            }]
        );
        assert!(s.is_creator());
        assert_eq!(s.phase(), SessionPhase::Lobby);
        assert!(s.start_game_request().is_ok());
    }

    #[test]
    fn test_failed_join_surfaces_message() {
        let mut s = session();
        let effects = s.apply(ServerEvent::JoinResult {
            request_id: 1,
            success: false,
            room_code: None,
            message: Some("Invalid room code".into()),
        });
        assert_eq!(
            effects,
            vec![SessionEffect::JoinFailed {
                message: "Invalid room code".into()
            }]
        );
        assert_eq!(s.phase(), SessionPhase::Menu);
        assert!(matches!(s.start_game_request(), Err(ClientError::NotInRoom)));
    }

    #[test]
    fn test_joiner_cannot_start() {
        let s = playing(2, vec![view(2, "Hank", 50.0)]);
        assert!(matches!(s.start_game_request(), Err(ClientError::NotCreator)));
    }

    #[test]
    fn test_roster_spawns_updates_and_despawns_proxies() {
        let mut s = session();
        let effects = s.apply(roster(vec![
            view(1, "Me", 0.0),
            view(2, "Bo", 10.0),
            view(3, "Cy", 20.0),
        ]));
        assert!(effects.contains(&SessionEffect::ProxySpawned(PlayerId(2))));
        assert!(effects.contains(&SessionEffect::ProxySpawned(PlayerId(3))));
        assert!(s.proxy(ME).is_none(), "no proxy for the local player");
        assert_eq!(s.roster_names(), ["Me", "Bo", "Cy"]);

        let mut moved = view(2, "Bo", 30.0);
        moved.caught = true;
        let effects = s.apply(roster(vec![view(1, "Me", 0.0), moved]));
        assert_eq!(
            effects,
            vec![
                SessionEffect::ProxyDespawned(PlayerId(3)),
                SessionEffect::RosterChanged {
                    names: vec!["Me".into(), "Bo".into()]
                },
            ]
        );
        let bo = s.proxy(PlayerId(2)).unwrap();
        assert_eq!(bo.position.x, 30.0);
        assert!(bo.caught);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut s = session();
        let list = roster(vec![view(1, "Me", 0.0), view(2, "Bo", 10.0)]);
        assert!(!s.apply(list.clone()).is_empty());
        assert!(s.apply(list).is_empty());
        assert_eq!(s.proxies().count(), 1);
    }

    #[test]
    fn test_game_started_marks_hunter_proxy() {
        let s = playing(2, vec![view(2, "Hank", 50.0)]);
        assert!(!s.is_hunter());
        assert_eq!(s.hunter(), Some(PlayerId(2)));
        assert!(s.proxy(PlayerId(2)).unwrap().marked);
        assert_eq!(s.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_player_moved_updates_known_proxy_only() {
        let mut s = playing(1, vec![view(2, "Bo", 50.0)]);
        let anim = AnimationState {
            is_waving: true,
            ..AnimationState::default()
        };
        s.apply(ServerEvent::PlayerMoved {
            id: PlayerId(2),
            position: Position::new(5.0, 2.4, 5.0),
            animation_state: anim,
        });
        s.apply(ServerEvent::PlayerMoved {
            id: PlayerId(9),
            position: Position::default(),
            animation_state: anim,
        });
        let bo = s.proxy(PlayerId(2)).unwrap();
        assert_eq!(bo.position, Position::new(5.0, 2.4, 5.0));
        assert!(bo.animation.is_waving);
        assert!(s.proxy(PlayerId(9)).is_none());
    }

    #[test]
    fn test_caught_proxy_is_marked() {
        let mut s = playing(1, vec![view(2, "Bo", 50.0)]);
        let effects = s.apply(ServerEvent::PlayerCaught {
            target: PlayerId(2),
        });
        assert_eq!(effects, vec![SessionEffect::ProxyMarked(PlayerId(2))]);
        assert!(s.proxy(PlayerId(2)).unwrap().caught);
    }

    #[test]
    fn test_self_caught_notifies_and_keeps_control() {
        let mut s = playing(2, vec![view(2, "Hank", 50.0)]);
        let effects = s.apply(ServerEvent::PlayerCaught { target: ME });
        assert_eq!(effects, vec![SessionEffect::Notify(CAUGHT_NOTICE.into())]);
        assert!(s.is_self_caught());

        let out = s.step(&InputState::forward());
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], ClientEvent::UpdatePosition { .. }));
        assert!(s.avatar().position.z < 0.0, "still moving after capture");
    }

    #[test]
    fn test_step_does_nothing_before_start() {
        let mut s = session();
        assert!(s.step(&InputState::forward()).is_empty());
        assert_eq!(s.avatar().position, Position::new(0.0, 2.4, 0.0));
    }

    #[test]
    fn test_step_always_reports_position_even_when_blocked() {
        let mut s = playing(2, vec![view(2, "Hank", 50.0)]);
        s = s.with_world(
            World::open(&WorldConfig::default())
                .with_obstacles([crate::Obstacle::new(0.0, -0.5, 1.0)]),
        );

        let out = s.step(&InputState::forward());
        match &out[0] {
            ClientEvent::UpdatePosition {
                position,
                animation_state,
                ..
            } => {
                assert_eq!(*position, Position::new(0.0, 2.4, 0.0));
                assert!(!animation_state.is_moving);
            }
            other => panic!("expected UpdatePosition, got {other:?}"),
        }
    }

    #[test]
    fn test_hunter_claims_runners_in_reach() {
        let mut s = playing(
            1,
            vec![view(2, "Bo", 0.5), view(3, "Cy", 0.9), view(4, "Di", 1.0)],
        );
        let out = s.step(&InputState::default());
        assert_eq!(claims(&out), vec![PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn test_hunter_skips_caught_runners() {
        let mut s = playing(1, vec![view(2, "Bo", 0.5)]);
        s.apply(ServerEvent::PlayerCaught {
            target: PlayerId(2),
        });
        assert!(claims(&s.step(&InputState::default())).is_empty());
    }

    #[test]
    fn test_runner_claims_self_near_hunter_only() {
        let mut s = playing(2, vec![view(2, "Hank", 0.5), view(3, "Cy", 0.2)]);
        let out = s.step(&InputState::default());
        assert_eq!(claims(&out), vec![ME]);

        let mut far = playing(2, vec![view(2, "Hank", 3.0), view(3, "Cy", 0.2)]);
        assert!(claims(&far.step(&InputState::default())).is_empty());
    }

    #[test]
    fn test_runner_stops_self_claims_once_caught() {
        let mut s = playing(2, vec![view(2, "Hank", 0.5)]);
        s.apply(ServerEvent::PlayerCaught { target: ME });
        assert!(claims(&s.step(&InputState::default())).is_empty());
    }

    #[test]
    fn test_stale_roster_does_not_uncatch_proxy() {
        let mut s = playing(1, vec![view(2, "Bo", 0.5)]);
        s.apply(ServerEvent::PlayerCaught {
            target: PlayerId(2),
        });
        // A roster from before the capture arrives late.
        s.apply(roster(vec![view(1, "Me", 0.0), view(2, "Bo", 0.5)]));

        let bo = s.proxy(PlayerId(2)).unwrap();
        assert!(bo.caught);
        assert!(bo.marked);
        assert!(claims(&s.step(&InputState::default())).is_empty());
    }

    #[test]
    fn test_game_over_ends_session() {
        let mut s = playing(1, vec![view(2, "Bo", 50.0)]);
        let effects = s.apply(ServerEvent::GameOver {
            winner: Winner::Hunter,
        });
        assert_eq!(
            effects,
            vec![SessionEffect::GameOver {
                winner: Winner::Hunter
            }]
        );
        assert_eq!(s.phase(), SessionPhase::Over);
        assert!(s.step(&InputState::forward()).is_empty());
    }
}
