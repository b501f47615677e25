//! Client end of the wire: envelopes, handshake and acknowledged requests.

use std::collections::VecDeque;
use std::time::Instant;

use chase_protocol::{
    Channel, ClientEvent, Codec, Envelope, JsonCodec, PROTOCOL_VERSION, Payload, PlayerId,
    PlayerName, RoomCode, ServerEvent, SystemMessage,
};
use chase_transport::{Connection, TransportError, WebSocketConnection};

use crate::ClientError;

/// A handshaken connection to the relay server.
///
/// Server events that arrive while a request waits for its acknowledgment
/// are kept, acknowledgment included, and handed out by [`recv`](Self::recv)
/// in arrival order.
pub struct ClientLink<C> {
    conn: C,
    codec: JsonCodec,
    player_id: PlayerId,
    seq: u64,
    next_request: u32,
    started: Instant,
    backlog: VecDeque<ServerEvent>,
}

impl ClientLink<WebSocketConnection> {
    /// Dials `url` and performs the handshake.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let conn = WebSocketConnection::connect(url).await?;
        Self::handshake(conn).await
    }
}

impl<C> ClientLink<C>
where
    C: Connection<Error = TransportError>,
{
    /// Sends the protocol handshake on `conn` and waits for the identity the
    /// server assigns.
    pub async fn handshake(conn: C) -> Result<Self, ClientError> {
        let mut link = Self {
            conn,
            codec: JsonCodec,
            player_id: PlayerId(0),
            seq: 0,
            next_request: 0,
            started: Instant::now(),
            backlog: VecDeque::new(),
        };
        link.send_payload(
            Channel::ReliableOrdered,
            Payload::System(SystemMessage::Handshake {
                version: PROTOCOL_VERSION,
            }),
        )
        .await?;

        let Some(envelope) = link.read_envelope().await? else {
            return Err(ClientError::ConnectionClosed);
        };
        match envelope.payload {
            Payload::System(SystemMessage::HandshakeAck { player_id, .. }) => {
                link.player_id = player_id;
                tracing::debug!(%player_id, "handshake complete");
                Ok(link)
            }
            Payload::System(SystemMessage::Error { code, message }) => {
                Err(ClientError::Server { code, message })
            }
            other => Err(ClientError::UnexpectedMessage(format!("{other:?}"))),
        }
    }

    /// The identity the server gave this connection.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Sends one game event. Transform pushes go out unreliably.
    pub async fn send(&mut self, event: ClientEvent) -> Result<(), ClientError> {
        let channel = match event {
            ClientEvent::UpdatePosition { .. } => Channel::Unreliable,
            _ => Channel::ReliableOrdered,
        };
        self.send_payload(channel, Payload::Client(event)).await
    }

    /// Next server event. `None` once the server has gone away.
    pub async fn recv(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        if let Some(event) = self.backlog.pop_front() {
            return Ok(Some(event));
        }
        self.read_event().await
    }

    /// Asks for a new room and waits for its code.
    pub async fn create_room(&mut self, name: &str) -> Result<RoomCode, ClientError> {
        let player_name = PlayerName::parse(name).map_err(|_| ClientError::EmptyName)?;
        let request_id = self.next_request_id();
        self.send(ClientEvent::CreateRoom {
            request_id,
            player_name,
        })
        .await?;

        loop {
            let event = self.read_event().await?.ok_or(ClientError::ConnectionClosed)?;
            let ack = match &event {
                ServerEvent::RoomCreated {
                    request_id: id,
                    room_code,
                } if *id == request_id => Some(room_code.clone()),
                _ => None,
            };
            self.backlog.push_back(event);
            if let Some(code) = ack {
                return Ok(code);
            }
        }
    }

    /// Joins the room typed in as `code`.
    ///
    /// # Errors
    /// [`ClientError::JoinRefused`] with the server's message if the room
    /// does not exist or has already started.
    pub async fn join_room(&mut self, code: &str, name: &str) -> Result<RoomCode, ClientError> {
        let room_code = RoomCode::normalize(code).ok_or(ClientError::MissingJoinDetails)?;
        let player_name =
            PlayerName::parse(name).map_err(|_| ClientError::MissingJoinDetails)?;
        let request_id = self.next_request_id();
        self.send(ClientEvent::JoinRoom {
            request_id,
            room_code,
            player_name,
        })
        .await?;

        loop {
            let event = self.read_event().await?.ok_or(ClientError::ConnectionClosed)?;
            let ack = match &event {
                ServerEvent::JoinResult {
                    request_id: id,
                    success,
                    room_code,
                    message,
                } if *id == request_id => Some(match (success, room_code) {
                    (true, Some(code)) => Ok(code.clone()),
                    _ => Err(ClientError::JoinRefused(
                        message.clone().unwrap_or_default(),
                    )),
                }),
                _ => None,
            };
            self.backlog.push_back(event);
            if let Some(result) = ack {
                return result;
            }
        }
    }

    /// Says goodbye and closes the connection.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.send_payload(
            Channel::ReliableOrdered,
            Payload::System(SystemMessage::Disconnect {
                reason: "client closed".into(),
            }),
        )
        .await?;
        self.conn.close().await?;
        Ok(())
    }

    fn next_request_id(&mut self) -> u32 {
        self.next_request = self.next_request.wrapping_add(1);
        self.next_request
    }

    async fn send_payload(&mut self, channel: Channel, payload: Payload) -> Result<(), ClientError> {
        self.seq += 1;
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.started.elapsed().as_millis() as u64,
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

    async fn read_envelope(&mut self) -> Result<Option<Envelope>, ClientError> {
        let Some(bytes) = self.conn.recv().await? else {
            return Ok(None);
        };
        Ok(Some(self.codec.decode(&bytes)?))
    }

    /// Reads frames until a game event or a goodbye.
    ///
    /// The server keeps the connection open after refusing a frame, so an
    /// error frame is logged and skipped.
    async fn read_event(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        loop {
            let Some(envelope) = self.read_envelope().await? else {
                return Ok(None);
            };
            match envelope.payload {
                Payload::Server(event) => return Ok(Some(event)),
                Payload::System(SystemMessage::Disconnect { reason }) => {
                    tracing::debug!(player_id = %self.player_id, %reason, "server said goodbye");
                    return Ok(None);
                }
                Payload::System(SystemMessage::Error { code, message }) => {
                    tracing::warn!(player_id = %self.player_id, code, %message, "server refused a frame");
                }
                other => return Err(ClientError::UnexpectedMessage(format!("{other:?}"))),
            }
        }
    }
}
