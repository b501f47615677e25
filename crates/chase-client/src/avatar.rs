//! The locally controlled player: camera-relative movement and the
//! per-frame animation state it reports.

use chase_protocol::{AnimationState, Position};
use rand::Rng;

use crate::{InputState, MovementConfig, World};

/// Frames a wave lasts.
pub const WAVE_FRAMES: f64 = 90.0;
/// Crouch blend change per frame.
const CROUCH_STEP: f64 = 0.1;
/// Walk cycle phase change per frame.
const WALK_STEP: f64 = 0.1;

/// Advances one character's animation by a frame.
///
/// Used for the local avatar and for every remote proxy between updates.
/// A wave takes precedence over the walk cycle.
pub fn animate(anim: &mut AnimationState) {
    anim.crouch_amount = if anim.is_crouching {
        (anim.crouch_amount + CROUCH_STEP).min(1.0)
    } else {
        (anim.crouch_amount - CROUCH_STEP).max(0.0)
    };

    if anim.is_waving {
        anim.wave_time += 1.0;
        if anim.wave_time >= WAVE_FRAMES {
            anim.is_waving = false;
            anim.wave_time = 0.0;
        }
    } else if anim.is_moving {
        anim.animation_time += WALK_STEP;
    }
}

#[derive(Debug, Clone)]
pub struct Avatar {
    pub position: Position,
    /// Facing around the vertical axis; `atan2(dx, dz)` of the last move.
    pub heading: f64,
    /// Orbit angle of the follow camera. The camera sits at
    /// `(sin yaw, cos yaw)` from the avatar and looks at it.
    pub camera_yaw: f64,
    pub animation: AnimationState,
}

impl Avatar {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            heading: 0.0,
            camera_yaw: 0.0,
            animation: AnimationState::default(),
        }
    }

    /// A fresh avatar at a random point on the +x axis.
    pub fn spawn(rng: &mut impl Rng, movement: &MovementConfig) -> Self {
        let x = rng.random_range(0..=movement.spawn_x_max) as f64;
        Self::new(Position::new(x, movement.spawn_height, 0.0))
    }

    /// Applies held turn keys to the camera.
    pub fn turn_camera(&mut self, input: &InputState, sensitivity: f64) {
        if input.turn_right {
            self.camera_yaw -= sensitivity;
        }
        if input.turn_left {
            self.camera_yaw += sensitivity;
        }
    }

    /// Applies the crouch and wave controls to the animation flags.
    pub fn apply_actions(&mut self, input: &InputState) {
        self.animation.is_crouching = input.crouch;
        if input.wave && !self.animation.is_waving {
            self.animation.is_waving = true;
            self.animation.wave_time = 0.0;
        }
    }

    /// Unit ground-plane direction of the held movement keys, relative to
    /// the camera. `None` when nothing is held or the keys cancel out.
    pub fn intended_direction(&self, input: &InputState) -> Option<(f64, f64)> {
        let (sin, cos) = self.camera_yaw.sin_cos();
        let forward = (-sin, -cos);
        let right = (cos, -sin);

        let mut dx = 0.0;
        let mut dz = 0.0;
        let mut add = |(x, z): (f64, f64), sign: f64| {
            dx += x * sign;
            dz += z * sign;
        };
        if input.forward {
            add(forward, 1.0);
        }
        if input.back {
            add(forward, -1.0);
        }
        if input.strafe_right {
            add(right, 1.0);
        }
        if input.strafe_left {
            add(right, -1.0);
        }

        let len = (dx * dx + dz * dz).sqrt();
        (len > 1e-6).then(|| (dx / len, dz / len))
    }

    /// Moves one frame's worth towards the held direction if `world` allows
    /// the destination. Returns whether the avatar moved.
    ///
    /// A blocked move leaves the position untouched and clears `is_moving`.
    pub fn try_move(&mut self, input: &InputState, movement: &MovementConfig, world: &World) -> bool {
        let Some((dx, dz)) = self.intended_direction(input) else {
            self.animation.is_moving = false;
            return false;
        };
        let speed = if self.animation.is_crouching {
            movement.crouch_speed
        } else {
            movement.walk_speed
        };
        let candidate = Position::new(
            self.position.x + dx * speed,
            self.position.y,
            self.position.z + dz * speed,
        );

        let moved = world.is_position_free(&candidate);
        if moved {
            self.position = candidate;
            self.heading = dx.atan2(dz);
        }
        self.animation.is_moving = moved;
        moved
    }
}
