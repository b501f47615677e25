//! Wall-clock frame scheduler.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

use crate::{TickConfig, TickInfo, TickPolicy, TickSource};

/// Counters kept across the scheduler's life.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    /// Frames that started more than 10% late.
    pub total_overruns: u64,
    /// Frames dropped by the overrun policy.
    pub total_skipped: u64,
    /// Moving average (α = 0.1) of the work time reported through
    /// [`TickScheduler::record_tick_end`].
    pub avg_tick_time: Duration,
    pub max_tick_time: Duration,
}

/// Fires frames at a fixed rate on the Tokio clock.
///
/// Sits in a `tokio::select!` next to the socket read:
///
/// ```ignore
/// loop {
///     tokio::select! {
///         frame = scheduler.wait_for_tick() => {
///             push_state(frame.dt);
///             scheduler.record_tick_end();
///         }
///         msg = link.recv() => apply(msg?),
///     }
/// }
/// ```
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    next_tick: Option<TokioInstant>,
    /// Set when a frame fires, taken by `record_tick_end`.
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|d| {
            let jitter = if config.initial_jitter_us > 0 {
                Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
            } else {
                Duration::ZERO
            };
            TokioInstant::now() + d + jitter
        });

        debug!(
            rate_hz = config.tick_rate_hz,
            policy = ?config.policy,
            "frame scheduler created"
        );

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next frame.
    ///
    /// With a rate of 0 this never resolves; other `select!` branches keep
    /// running.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (Some(next), Some(frame)) = (self.next_tick, self.tick_duration) else {
            return std::future::pending().await;
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > frame / 10;
        let behind = (late_by.as_nanos() / frame.as_nanos()) as u64;
        let mut ticks_skipped = 0;

        self.next_tick = Some(match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = behind;
                }
                now + frame
            }
            TickPolicy::CatchUp { max_catchup } if overrun => {
                if behind <= u64::from(max_catchup) {
                    next + frame
                } else {
                    ticks_skipped = behind - u64::from(max_catchup);
                    now + frame
                }
            }
            TickPolicy::CatchUp { .. } | TickPolicy::Drop => next + frame,
        });

        if overrun {
            self.metrics.total_overruns += 1;
            warn!(
                tick = self.tick_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                skipped = ticks_skipped,
                "frame started late"
            );
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;
        trace!(tick = self.tick_count, overrun, "frame");

        TickInfo {
            tick: self.tick_count,
            dt: frame,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the current frame's work and updates the metrics.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        if let Some(budget) = self.tick_duration {
            let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
            if utilization >= self.config.budget_warn_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = budget.as_secs_f64() * 1000.0,
                    "frame work near budget"
                );
            }
        }

        self.metrics.max_tick_time = self.metrics.max_tick_time.max(elapsed);
        let prev = self.metrics.avg_tick_time.as_secs_f64();
        self.metrics.avg_tick_time =
            Duration::from_secs_f64(prev * 0.9 + elapsed.as_secs_f64() * 0.1);
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}

impl TickSource for TickScheduler {
    async fn next_tick(&mut self) -> Option<TickInfo> {
        Some(self.wait_for_tick().await)
    }

    fn end_tick(&mut self) {
        self.record_tick_end();
    }
}
