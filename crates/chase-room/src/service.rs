//! The room service: sole owner of the room store.
//!
//! All mutating operations live on [`RoomService`] and are split by concern:
//! lifecycle (`lifecycle.rs`), tag resolution (`tags.rs`) and position
//! replication (`replication.rs`). Each operation runs to completion on
//! `&mut self` and returns the broadcasts it caused, so the caller decides
//! how and when they reach the network.

use chase_protocol::{PlayerId, RoomCode, ServerEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::code::generate_code;
use crate::{Outbound, RoomConfig, RoomSnapshot, RoomStore};

/// Owns the [`RoomStore`] plus the randomness used for codes and hunter
/// selection.
pub struct RoomService {
    pub(crate) store: RoomStore,
    pub(crate) config: RoomConfig,
    pub(crate) rng: StdRng,
}

impl RoomService {
    /// A service over an empty store, seeded from the OS.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// A service with a fixed seed, for reproducible codes and hunters.
    pub fn with_seed(config: RoomConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RoomConfig, rng: StdRng) -> Self {
        Self {
            store: RoomStore::new(),
            config: config.validated(),
            rng,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Read-only access to the store.
    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    pub fn snapshot(&self, code: &RoomCode) -> Option<RoomSnapshot> {
        self.store.get(code).map(RoomSnapshot::from)
    }

    pub fn room_count(&self) -> usize {
        self.store.len()
    }

    /// Draws codes until one is free.
    pub(crate) fn fresh_code(&mut self) -> RoomCode {
        loop {
            let code = generate_code(&mut self.rng, self.config.code_length);
            if !self.store.contains(&code) {
                return code;
            }
            tracing::debug!(%code, "room code collision, drawing again");
        }
    }

    /// Every current member of `code`, optionally minus one player.
    pub(crate) fn members(&self, code: &RoomCode, except: Option<PlayerId>) -> Vec<PlayerId> {
        self.store
            .get(code)
            .map(|room| {
                room.players
                    .iter()
                    .map(|p| p.id)
                    .filter(|id| Some(*id) != except)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The current roster of `code`, addressed to all of its members.
    pub(crate) fn roster_broadcast(&self, code: &RoomCode) -> Option<Outbound> {
        let room = self.store.get(code)?;
        Some(Outbound::reliable(
            room.member_ids(),
            ServerEvent::PlayerList {
                players: room.roster(),
            },
        ))
    }
}
