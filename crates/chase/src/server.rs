//! `ChaseServer` builder and server loop.
//!
//! This is the entry point for running a Chase relay. It ties together all
//! the layers: transport → protocol → lobby actor.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chase_protocol::{Codec, JsonCodec};
use chase_room::{LobbyHandle, RoomConfig, RoomService, spawn_lobby};
use chase_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ChaseError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Room state
/// itself lives in the lobby actor; this only holds the handle to it.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) lobby: LobbyHandle,
    pub(crate) codec: C,
    pub(crate) handshake_timeout: Duration,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Builder for configuring and starting a Chase server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), chase::ChaseError> {
/// let server = chase::ChaseServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ChaseServerBuilder {
    config: ServerConfig,
}

impl ChaseServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Starts from an existing configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn lobby_capacity(mut self, capacity: usize) -> Self {
        self.config.lobby_capacity = capacity;
        self
    }

    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Makes room codes and the hunter draw reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Binds the listener and spawns the lobby actor.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<ChaseServer<JsonCodec>, ChaseError> {
        let config = self.config;
        let transport = WebSocketTransport::bind(&config.bind_addr).await?;

        let service = match config.seed {
            Some(seed) => RoomService::with_seed(config.room, seed),
            None => RoomService::new(config.room),
        };
        let lobby = spawn_lobby(service, config.lobby_capacity.max(1));

        let state = Arc::new(ServerState {
            lobby,
            codec: JsonCodec,
            handshake_timeout: config.handshake_timeout,
            idle_timeout: config.idle_timeout,
        });

        Ok(ChaseServer { transport, state })
    }
}

impl Default for ChaseServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Chase relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ChaseServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl ChaseServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ChaseServerBuilder {
        ChaseServerBuilder::new()
    }
}

impl<C> ChaseServer<C>
where
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ChaseError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle to the lobby actor, for inspecting rooms from outside.
    pub fn lobby(&self) -> LobbyHandle {
        self.state.lobby.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), ChaseError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Connections already being served keep their tasks; only accepting
    /// stops.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), ChaseError>
    where
        F: Future,
    {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "chase server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting");
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}
