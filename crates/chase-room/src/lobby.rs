//! Lobby actor: the one task that owns every room.
//!
//! All room-mutating commands from all connections funnel through a single
//! mpsc channel and run one at a time, to completion, on the actor's
//! [`RoomService`]. That is the whole concurrency story: no locks, and the
//! only ordering question is arrival order on the channel.

use std::collections::HashMap;

use chase_protocol::{AnimationState, PlayerId, PlayerName, Position, RoomCode};
use tokio::sync::{mpsc, oneshot};

use crate::{Outbound, Outgoing, PlayerSender, RoomError, RoomService, RoomSnapshot};

/// Commands sent to the lobby actor through its channel.
///
/// Variants carrying a `oneshot::Sender` expect an answer; the rest are
/// fire-and-forget, matching the protocol's un-acknowledged events.
pub(crate) enum LobbyCommand {
    /// Register the outbound queue of a freshly handshaken connection.
    Connect {
        player_id: PlayerId,
        sender: PlayerSender,
    },

    CreateRoom {
        player_id: PlayerId,
        name: PlayerName,
        reply: oneshot::Sender<RoomCode>,
    },

    JoinRoom {
        player_id: PlayerId,
        code: RoomCode,
        name: PlayerName,
        reply: oneshot::Sender<Result<RoomCode, RoomError>>,
    },

    StartGame {
        player_id: PlayerId,
        code: RoomCode,
    },

    UpdatePosition {
        player_id: PlayerId,
        code: RoomCode,
        position: Position,
        animation: AnimationState,
    },

    ClaimTag {
        claimant: PlayerId,
        code: RoomCode,
        target: PlayerId,
    },

    /// The connection is gone: leave its room and drop its queue.
    Disconnect { player_id: PlayerId },

    Snapshot {
        code: RoomCode,
        reply: oneshot::Sender<Option<RoomSnapshot>>,
    },

    RoomCount { reply: oneshot::Sender<usize> },
}

/// Handle to the running lobby actor.
///
/// Cheap to clone; every connection task holds one. Every method fails
/// with [`RoomError::Unavailable`] once the actor has stopped.
#[derive(Clone)]
pub struct LobbyHandle {
    sender: mpsc::Sender<LobbyCommand>,
}

impl LobbyHandle {
    async fn send(&self, cmd: LobbyCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Registers where broadcasts for `player_id` should be delivered.
    pub async fn connect(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        self.send(LobbyCommand::Connect { player_id, sender }).await
    }

    /// Creates a room and returns its code.
    ///
    /// The roster broadcast is queued on the player's sender before this
    /// returns, so a caller that writes the acknowledgment before draining
    /// its queue keeps ack-then-roster order on the wire.
    pub async fn create_room(
        &self,
        player_id: PlayerId,
        name: PlayerName,
    ) -> Result<RoomCode, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LobbyCommand::CreateRoom {
            player_id,
            name,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Joins the room under `code`.
    ///
    /// # Errors
    /// `NotFound` or `GameAlreadyStarted` for a refused join, and
    /// `Unavailable` if the actor is gone.
    pub async fn join_room(
        &self,
        player_id: PlayerId,
        code: RoomCode,
        name: PlayerName,
    ) -> Result<RoomCode, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LobbyCommand::JoinRoom {
            player_id,
            code,
            name,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    pub async fn start_game(&self, player_id: PlayerId, code: RoomCode) -> Result<(), RoomError> {
        self.send(LobbyCommand::StartGame { player_id, code }).await
    }

    pub async fn update_position(
        &self,
        player_id: PlayerId,
        code: RoomCode,
        position: Position,
        animation: AnimationState,
    ) -> Result<(), RoomError> {
        self.send(LobbyCommand::UpdatePosition {
            player_id,
            code,
            position,
            animation,
        })
        .await
    }

    pub async fn claim_tag(
        &self,
        claimant: PlayerId,
        code: RoomCode,
        target: PlayerId,
    ) -> Result<(), RoomError> {
        self.send(LobbyCommand::ClaimTag {
            claimant,
            code,
            target,
        })
        .await
    }

    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(LobbyCommand::Disconnect { player_id }).await
    }

    /// A copy of the room under `code`, if it exists.
    ///
    /// Commands are handled in order, so the snapshot reflects every
    /// command this handle sent before it.
    pub async fn snapshot(&self, code: RoomCode) -> Result<Option<RoomSnapshot>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LobbyCommand::Snapshot {
            code,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    pub async fn room_count(&self) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(LobbyCommand::RoomCount { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }
}

struct LobbyActor {
    service: RoomService,
    /// Per-player outbound queues.
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<LobbyCommand>,
}

impl LobbyActor {
    /// Processes commands until every handle is dropped.
    async fn run(mut self) {
        tracing::info!("lobby actor started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle(cmd);
        }

        tracing::info!(rooms = self.service.room_count(), "lobby actor stopped");
    }

    fn handle(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Connect { player_id, sender } => {
                self.senders.insert(player_id, sender);
            }
            LobbyCommand::CreateRoom {
                player_id,
                name,
                reply,
            } => {
                let (code, out) = self.service.create_room(player_id, name);
                self.dispatch(out);
                let _ = reply.send(code);
            }
            LobbyCommand::JoinRoom {
                player_id,
                code,
                name,
                reply,
            } => {
                let result = match self.service.join_room(player_id, &code, name) {
                    Ok((code, out)) => {
                        self.dispatch(out);
                        Ok(code)
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, %code, error = %e, "join refused");
                        Err(e)
                    }
                };
                let _ = reply.send(result);
            }
            LobbyCommand::StartGame { player_id, code } => {
                let out = self.service.start_game(player_id, &code);
                self.dispatch(out);
            }
            LobbyCommand::UpdatePosition {
                player_id,
                code,
                position,
                animation,
            } => {
                let out = self
                    .service
                    .update_position(player_id, &code, position, animation);
                self.dispatch(out);
            }
            LobbyCommand::ClaimTag {
                claimant,
                code,
                target,
            } => {
                let out = self.service.claim_tag(claimant, &code, target);
                self.dispatch(out);
            }
            LobbyCommand::Disconnect { player_id } => {
                let out = self.service.handle_disconnect(player_id);
                self.senders.remove(&player_id);
                self.dispatch(out);
            }
            LobbyCommand::Snapshot { code, reply } => {
                let _ = reply.send(self.service.snapshot(&code));
            }
            LobbyCommand::RoomCount { reply } => {
                let _ = reply.send(self.service.room_count());
            }
        }
    }

    /// Fans each outbound event out to its recipients' queues.
    fn dispatch(&self, out: Vec<Outbound>) {
        for Outbound { to, channel, event } in out {
            for player_id in to {
                self.send_to(
                    player_id,
                    Outgoing {
                        channel,
                        event: event.clone(),
                    },
                );
            }
        }
    }

    /// Silently drops if the player's connection is already gone.
    fn send_to(&self, player_id: PlayerId, msg: Outgoing) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }
}

/// Spawns the lobby actor over `service` and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_lobby(service: RoomService, channel_size: usize) -> LobbyHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = LobbyActor {
        service,
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    LobbyHandle { sender: tx }
}
