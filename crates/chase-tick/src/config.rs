//! Frame cadence configuration.

use std::time::Duration;

use tracing::warn;

/// What to do when a frame starts late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed frames and schedule the next one from now.
    #[default]
    Skip,
    /// Fire up to `max_catchup` missed frames back to back, then fall back
    /// to [`TickPolicy::Skip`].
    CatchUp { max_catchup: u32 },
    /// Keep the original schedule; the late frame is simply late.
    Drop,
}

/// Configuration for a [`TickScheduler`](crate::TickScheduler).
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Frames per second. 0 means the scheduler never fires on its own.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the frame budget (0.0–1.0) that a frame's work may use
    /// before a warning is logged.
    pub budget_warn_threshold: f64,
    /// Upper bound (µs) of a random delay added to the first frame, so many
    /// headless clients started together do not push in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    /// 60 frames per second, the cadence a browser paints at.
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.9,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 240;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Caps the rate at [`Self::MAX_TICK_RATE_HZ`] and clamps the warning
    /// threshold into `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz above maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Length of one frame, or `None` when the rate is 0.
    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0).then(|| Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sixty_hz_skip() {
        let cfg = TickConfig::default();
        assert_eq!(cfg.tick_rate_hz, 60);
        assert_eq!(cfg.policy, TickPolicy::Skip);
        assert_eq!(cfg.tick_duration(), Some(Duration::from_secs_f64(1.0 / 60.0)));
    }

    #[test]
    fn test_zero_rate_has_no_duration() {
        assert_eq!(TickConfig::with_rate(0).tick_duration(), None);
    }

    #[test]
    fn test_validated_clamps() {
        let cfg = TickConfig {
            tick_rate_hz: 1_000,
            budget_warn_threshold: 3.0,
            ..TickConfig::default()
        }
        .validated();
        assert_eq!(cfg.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
        assert_eq!(cfg.budget_warn_threshold, 1.0);
    }
}
