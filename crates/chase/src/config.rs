//! Server settings.

use std::time::Duration;

use chase_room::RoomConfig;

/// Everything [`ChaseServer`](crate::ChaseServer) needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// How long a fresh connection may take to send its handshake.
    pub handshake_timeout: Duration,

    /// Drop a connection that sends nothing for this long. `None` keeps
    /// silent connections open until the socket closes.
    pub idle_timeout: Option<Duration>,

    /// Bound of the lobby actor's command queue.
    pub lobby_capacity: usize,

    pub room: RoomConfig,

    /// Seeds the room service RNG (codes, hunter draw). Random if `None`.
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub const DEFAULT_BIND: &'static str = "0.0.0.0:3000";
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: Self::DEFAULT_BIND.to_string(),
            handshake_timeout: Duration::from_secs(5),
            idle_timeout: None,
            lobby_capacity: 64,
            room: RoomConfig::default(),
            seed: None,
        }
    }
}
