//! Local collision and boundary check.
//!
//! Advisory only: the server never re-checks positions, so this is what
//! keeps an honest client on the island and out of the rocks.

use chase_protocol::Position;

use crate::WorldConfig;

/// A static obstacle on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    pub z: f64,
    /// `None` falls back to the world's default radius.
    pub collision_radius: Option<f64>,
}

impl Obstacle {
    pub fn new(x: f64, z: f64, collision_radius: f64) -> Self {
        Self {
            x,
            z,
            collision_radius: Some(collision_radius),
        }
    }
}

/// The walkable area: a disc around the origin minus its obstacles.
#[derive(Debug, Clone)]
pub struct World {
    pub boundary_radius: f64,
    pub default_collision_radius: f64,
    pub obstacles: Vec<Obstacle>,
}

impl World {
    /// An island with no obstacles.
    pub fn open(config: &WorldConfig) -> Self {
        Self {
            boundary_radius: config.boundary_radius,
            default_collision_radius: config.default_collision_radius,
            obstacles: Vec::new(),
        }
    }

    pub fn with_obstacles(mut self, obstacles: impl IntoIterator<Item = Obstacle>) -> Self {
        self.obstacles.extend(obstacles);
        self
    }

    /// Whether a player may stand at `pos`.
    ///
    /// Height is ignored. A point exactly on the boundary or exactly one
    /// collision radius from an obstacle is allowed.
    pub fn is_position_free(&self, pos: &Position) -> bool {
        if pos.planar_radius() > self.boundary_radius {
            return false;
        }
        self.obstacles.iter().all(|obstacle| {
            let radius = obstacle
                .collision_radius
                .unwrap_or(self.default_collision_radius);
            let dx = pos.x - obstacle.x;
            let dz = pos.z - obstacle.z;
            (dx * dx + dz * dz).sqrt() >= radius
        })
    }
}
