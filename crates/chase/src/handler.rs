//! Per-connection handler: handshake, event routing and fan-out.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version
//!   2. Send HandshakeAck carrying the connection's player id
//!   3. Register an outbound queue with the lobby
//!   4. Loop: route client events to the lobby, write queued broadcasts

use std::sync::Arc;
use std::time::{Duration, Instant};

use chase_protocol::{
    Channel, ClientEvent, Codec, Envelope, PROTOCOL_VERSION, Payload, PlayerId, ProtocolError,
    ServerEvent, SystemMessage,
};
use chase_room::{LobbyHandle, Outgoing, RoomError};
use chase_transport::{Connection, TransportError, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ChaseError;
use crate::server::ServerState;

/// Drop guard that removes the player from the lobby when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async send.
struct LobbyGuard {
    player_id: PlayerId,
    lobby: LobbyHandle,
}

impl Drop for LobbyGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let lobby = self.lobby.clone();
        tokio::spawn(async move {
            if let Err(e) = lobby.disconnect(player_id).await {
                tracing::debug!(%player_id, error = %e, "disconnect not delivered");
            }
        });
    }
}

/// Frames outgoing payloads into envelopes for one connection.
struct Writer<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<'a, C: Codec> Writer<'a, C> {
    fn new(conn: &'a WebSocketConnection, codec: &'a C) -> Self {
        Self {
            conn,
            codec,
            seq: 0,
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn send(&mut self, channel: Channel, payload: Payload) -> Result<(), ChaseError> {
        self.seq += 1;
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.elapsed_ms(),
            channel,
            payload,
        };
        let bytes = self.codec.encode(&envelope)?;
        match channel {
            Channel::Unreliable => self.conn.send_unreliable(&bytes).await?,
            Channel::ReliableOrdered => self.conn.send(&bytes).await?,
        }
        Ok(())
    }

    async fn event(&mut self, event: ServerEvent) -> Result<(), ChaseError> {
        self.send(Channel::ReliableOrdered, Payload::Server(event))
            .await
    }

    /// Sends a SystemMessage::Error envelope to the client.
    async fn error(&mut self, code: u16, message: &str) -> Result<(), ChaseError> {
        self.send(
            Channel::ReliableOrdered,
            Payload::System(SystemMessage::Error {
                code,
                message: message.to_string(),
            }),
        )
        .await
    }
}

/// What one read from the socket produced.
enum Inbound {
    Frame(Vec<u8>),
    Closed,
    Failed(TransportError),
    Idle,
}

async fn read_frame(conn: &WebSocketConnection, idle_timeout: Option<Duration>) -> Inbound {
    let received = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
            Ok(received) => received,
            Err(_) => return Inbound::Idle,
        },
        None => conn.recv().await,
    };
    match received {
        Ok(Some(data)) => Inbound::Frame(data),
        Ok(None) => Inbound::Closed,
        Err(e) => Inbound::Failed(e),
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ChaseError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut writer = Writer::new(&conn, &state.codec);

    // --- Step 1: Handshake ---
    let player_id = perform_handshake(&conn, &state, &mut writer).await?;
    tracing::info!(%conn_id, %player_id, "player connected");

    // --- Step 2: Register with the lobby ---
    let (tx, mut rx) = mpsc::unbounded_channel::<Outgoing>();
    state.lobby.connect(player_id, tx).await?;
    let _guard = LobbyGuard {
        player_id,
        lobby: state.lobby.clone(),
    };

    // --- Step 3: Message loop ---
    loop {
        tokio::select! {
            inbound = read_frame(&conn, state.idle_timeout) => {
                let data = match inbound {
                    Inbound::Frame(data) => data,
                    Inbound::Closed => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Inbound::Failed(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                    Inbound::Idle => {
                        tracing::info!(%player_id, "connection idle, dropping");
                        break;
                    }
                };

                let envelope: Envelope = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                        writer.error(400, &e.to_string()).await?;
                        continue;
                    }
                };

                match envelope.payload {
                    Payload::Client(event) => {
                        handle_client_event(&state.lobby, player_id, event, &mut writer).await?;
                    }
                    Payload::System(SystemMessage::Disconnect { reason }) => {
                        tracing::info!(%player_id, %reason, "client disconnected");
                        break;
                    }
                    Payload::System(_) => {
                        tracing::debug!(%player_id, "ignoring unexpected system message");
                    }
                    Payload::Server(_) => {
                        tracing::debug!(%player_id, "client sent a server event");
                        writer.error(400, "clients may not send server events").await?;
                    }
                }
            }
            Some(out) = rx.recv() => {
                writer.send(out.channel, Payload::Server(out.event)).await?;
            }
        }
    }

    // _guard drops here → lobby disconnect fires.
    Ok(())
}

/// Performs the initial handshake: receive Handshake, validate, send Ack.
async fn perform_handshake<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    writer: &mut Writer<'_, C>,
) -> Result<PlayerId, ChaseError> {
    let data = match tokio::time::timeout(state.handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(ChaseError::Transport(e)),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = match state.codec.decode(&data) {
        Ok(env) => env,
        Err(e) => {
            writer.error(400, "expected Handshake").await?;
            return Err(e.into());
        }
    };

    let version = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version }) => version,
        _ => {
            writer.error(400, "expected Handshake").await?;
            return Err(
                ProtocolError::InvalidMessage("first message must be Handshake".into()).into(),
            );
        }
    };

    if version != PROTOCOL_VERSION {
        writer
            .error(
                400,
                &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
            )
            .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let player_id = PlayerId(conn.id().into_inner());
    let server_time = writer.elapsed_ms();
    writer
        .send(
            Channel::ReliableOrdered,
            Payload::System(SystemMessage::HandshakeAck {
                player_id,
                server_time,
            }),
        )
        .await?;

    Ok(player_id)
}

/// Routes one client event to the lobby. Requests that carry a request id
/// are acknowledged here, before any broadcast they caused is written.
async fn handle_client_event<C: Codec>(
    lobby: &LobbyHandle,
    player_id: PlayerId,
    event: ClientEvent,
    writer: &mut Writer<'_, C>,
) -> Result<(), ChaseError> {
    match event {
        ClientEvent::CreateRoom {
            request_id,
            player_name,
        } => {
            let room_code = lobby.create_room(player_id, player_name).await?;
            writer
                .event(ServerEvent::RoomCreated {
                    request_id,
                    room_code,
                })
                .await?;
        }

        ClientEvent::JoinRoom {
            request_id,
            room_code,
            player_name,
        } => {
            let ack = match lobby.join_room(player_id, room_code, player_name).await {
                Ok(room_code) => ServerEvent::JoinResult {
                    request_id,
                    success: true,
                    room_code: Some(room_code),
                    message: None,
                },
                Err(RoomError::Unavailable) => return Err(RoomError::Unavailable.into()),
                Err(refused) => {
                    tracing::debug!(%player_id, reason = %refused, "join refused");
                    ServerEvent::JoinResult {
                        request_id,
                        success: false,
                        room_code: None,
                        message: Some(refused.to_string()),
                    }
                }
            };
            writer.event(ack).await?;
        }

        ClientEvent::StartGame { room_code } => {
            lobby.start_game(player_id, room_code).await?;
        }

        ClientEvent::UpdatePosition {
            room_code,
            position,
            animation_state,
        } => {
            lobby
                .update_position(player_id, room_code, position, animation_state)
                .await?;
        }

        ClientEvent::PlayerTagged { room_code, target } => {
            lobby.claim_tag(player_id, room_code, target).await?;
        }
    }
    Ok(())
}
