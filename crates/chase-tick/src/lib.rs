//! Frame cadence for the Chase client.
//!
//! The browser pushes its transform once per painted frame. Headless, the
//! same loop is driven by a [`TickSource`]: either a [`TickScheduler`] that
//! fires on the Tokio clock, or [`SyntheticTicks`] that fire immediately so
//! tests run without waiting.

#![allow(async_fn_in_trait)]

use std::time::Duration;

mod config;
mod scheduler;
mod source;

pub use config::{TickConfig, TickPolicy};
pub use scheduler::{TickMetrics, TickScheduler};
pub use source::{SyntheticTicks, TickSource};

/// One frame, as handed to the loop body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Starts at 1.
    pub tick: u64,
    /// Nominal frame length. Movement is per frame, so most callers only
    /// need this for pacing.
    pub dt: Duration,
    pub overrun: bool,
    pub ticks_skipped: u64,
}
