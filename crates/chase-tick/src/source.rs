//! Anything that can drive a frame loop.

use std::time::Duration;

use crate::TickInfo;

/// A stream of frames.
///
/// The client loop only asks for "the next frame", so a wall-clock
/// [`TickScheduler`](crate::TickScheduler) and a [`SyntheticTicks`] counter
/// are interchangeable.
pub trait TickSource {
    /// Waits for the next frame. `None` once the source is exhausted.
    async fn next_tick(&mut self) -> Option<TickInfo>;

    /// Called after the frame's work is done.
    fn end_tick(&mut self) {}
}

/// A fixed number of frames delivered as fast as the runtime allows.
///
/// Each frame yields to the scheduler first, so broadcasts already queued
/// on other tasks get a chance to arrive between frames.
#[derive(Debug, Clone)]
pub struct SyntheticTicks {
    dt: Duration,
    issued: u64,
    limit: Option<u64>,
}

impl SyntheticTicks {
    /// `limit` frames of length `dt`.
    pub fn new(dt: Duration, limit: u64) -> Self {
        Self {
            dt,
            issued: 0,
            limit: Some(limit),
        }
    }

    /// Never runs out.
    pub fn unbounded(dt: Duration) -> Self {
        Self {
            dt,
            issued: 0,
            limit: None,
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl TickSource for SyntheticTicks {
    async fn next_tick(&mut self) -> Option<TickInfo> {
        if self.limit.is_some_and(|limit| self.issued >= limit) {
            return None;
        }
        tokio::task::yield_now().await;
        self.issued += 1;
        Some(TickInfo {
            tick: self.issued,
            dt: self.dt,
            overrun: false,
            ticks_skipped: 0,
        })
    }
}
