//! Client-side tuning: world bounds and movement.

use chase_tick::{TickConfig, TickScheduler};
use serde::{Deserialize, Serialize};

/// Everything a headless client needs besides its connection.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub world: WorldConfig,
    pub movement: MovementConfig,
    /// Frame cadence of the driver loop.
    pub tick: TickConfig,
}

impl ClientConfig {
    /// A wall-clock frame source at the configured rate, for
    /// [`run_session`](crate::run_session).
    pub fn frame_clock(&self) -> TickScheduler {
        TickScheduler::new(self.tick.clone())
    }
}

/// Static facts about the island.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Players may not step further than this from the origin.
    pub boundary_radius: f64,
    /// Planar distance under which a tag claim is sent.
    pub tag_distance: f64,
    /// Collision radius of an obstacle that does not declare its own.
    pub default_collision_radius: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            boundary_radius: 145.0,
            tag_distance: 1.0,
            default_collision_radius: 2.0,
        }
    }
}

/// How the local avatar moves. Speeds are world units per frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    pub walk_speed: f64,
    pub crouch_speed: f64,
    /// Camera yaw change per frame while a turn key is held, in radians.
    pub camera_sensitivity: f64,
    /// Spawn `x` is drawn from `0..=spawn_x_max`.
    pub spawn_x_max: u32,
    pub spawn_height: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 0.5,
            crouch_speed: 0.15,
            camera_sensitivity: 0.06,
            spawn_x_max: 100,
            spawn_height: 2.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_clock_follows_tick_config() {
        let config = ClientConfig {
            tick: TickConfig::with_rate(30),
            ..ClientConfig::default()
        };
        let clock = config.frame_clock();
        assert_eq!(clock.tick_rate_hz(), 30);
        assert_eq!(ClientConfig::default().frame_clock().tick_rate_hz(), 60);
    }
}
