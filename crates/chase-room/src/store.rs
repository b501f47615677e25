//! In-memory room registry.
//!
//! The store is plain data: no channels, no randomness, no broadcasting.
//! It keeps two maps in step: rooms by code, and the room each player is
//! in. A player can be in at most one room at a time.

use std::collections::HashMap;

use chase_protocol::{AnimationState, PlayerId, PlayerName, PlayerView, Position, RoomCode};

use crate::RoomPhase;

/// A player as the server sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,
    pub position: Position,
    /// Flips false → true once and never back.
    pub caught: bool,
    pub animation: AnimationState,
}

impl Player {
    /// A fresh player at `spawn` with every animation flag cleared.
    pub fn new(id: PlayerId, name: PlayerName, spawn: Position) -> Self {
        Self {
            id,
            name,
            position: spawn,
            caught: false,
            animation: AnimationState::default(),
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            caught: self.caught,
            animation: self.animation,
        }
    }
}

/// One game session.
#[derive(Debug, Clone)]
pub struct Room {
    pub code: RoomCode,
    /// Join order.
    pub players: Vec<Player>,
    pub hunter: Option<PlayerId>,
    pub phase: RoomPhase,
    pub creator: PlayerId,
}

impl Room {
    /// A lobby with `creator` as its only player.
    pub fn new(code: RoomCode, creator: Player) -> Self {
        Self {
            code,
            creator: creator.id,
            players: vec![creator],
            hunter: None,
            phase: RoomPhase::Lobby,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn member_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// The roster as broadcast to clients.
    pub fn roster(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    /// The hunter's win condition: every player is either caught or is
    /// the hunter.
    ///
    /// A departed hunter is simply absent, so after a hunter disconnect
    /// every remaining player has to be caught.
    pub fn all_runners_caught(&self) -> bool {
        self.players
            .iter()
            .all(|p| p.caught || Some(p.id) == self.hunter)
    }
}

/// Read-only copy of a room, for inspection and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub players: Vec<PlayerView>,
    pub hunter: Option<PlayerId>,
    pub phase: RoomPhase,
    pub creator: PlayerId,
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            players: room.roster(),
            hunter: room.hunter,
            phase: room.phase,
            creator: room.creator,
        }
    }
}

/// Registry of active rooms, keyed by code.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomCode, Room>,
    /// Which room each player is in. Kept in sync with `rooms`.
    members: HashMap<PlayerId, RoomCode>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Registers a new room.
    ///
    /// Returns the room back if its code is taken or its creator already
    /// sits in another room; the store is unchanged in that case.
    pub fn insert(&mut self, room: Room) -> Result<(), Room> {
        if self.rooms.contains_key(&room.code) || self.members.contains_key(&room.creator) {
            return Err(room);
        }
        self.members.insert(room.creator, room.code.clone());
        self.rooms.insert(room.code.clone(), room);
        Ok(())
    }

    /// Appends `player` to the roster of `code`.
    ///
    /// Returns the player back if the room does not exist or the player
    /// is already in a room.
    pub fn admit(&mut self, code: &RoomCode, player: Player) -> Result<(), Player> {
        if self.members.contains_key(&player.id) {
            return Err(player);
        }
        let Some(room) = self.rooms.get_mut(code) else {
            return Err(player);
        };
        self.members.insert(player.id, code.clone());
        room.players.push(player);
        Ok(())
    }

    /// Removes a player from whatever room it is in.
    ///
    /// Returns the code of the room it left. The room itself stays, even
    /// when empty; removing it is the caller's decision.
    pub fn evict(&mut self, id: PlayerId) -> Option<RoomCode> {
        let code = self.members.remove(&id)?;
        if let Some(room) = self.rooms.get_mut(&code) {
            room.players.retain(|p| p.id != id);
        }
        Some(code)
    }

    /// Deletes a room and forgets the membership of everyone in it.
    pub fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        let room = self.rooms.remove(code)?;
        for player in &room.players {
            self.members.remove(&player.id);
        }
        Some(room)
    }

    /// The room a player is currently in, if any.
    pub fn room_of(&self, id: PlayerId) -> Option<&RoomCode> {
        self.members.get(&id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }
}
