//! Integration tests for the frame scheduler.
//!
//! Time-driven tests run on a paused Tokio clock: sleeps resolve as soon as
//! the runtime is idle, and `advance` simulates a stalled frame.

use std::time::Duration;

use chase_tick::{SyntheticTicks, TickConfig, TickPolicy, TickScheduler, TickSource};

// =========================================================================
// Helpers
// =========================================================================

/// 20 Hz (50 ms frames) with no start jitter.
fn config_20hz(policy: TickPolicy) -> TickConfig {
    TickConfig {
        initial_jitter_us: 0,
        policy,
        ..TickConfig::with_rate(20)
    }
}

// =========================================================================
// Creation
// =========================================================================

#[test]
fn test_scheduler_initial_state() {
    let s = TickScheduler::new(config_20hz(TickPolicy::Skip));
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.tick_rate_hz(), 20);
    assert_eq!(s.tick_duration(), Some(Duration::from_millis(50)));
    assert_eq!(s.metrics().total_ticks, 0);
}

#[test]
fn test_rate_above_maximum_is_clamped() {
    let s = TickScheduler::with_rate(10_000);
    assert_eq!(s.tick_rate_hz(), TickConfig::MAX_TICK_RATE_HZ);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_frames_fire_in_order_with_fixed_dt() {
    let mut s = TickScheduler::new(config_20hz(TickPolicy::Skip));

    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        assert_eq!(info.dt, Duration::from_millis(50));
        assert!(!info.overrun);
        s.record_tick_end();
    }
    assert_eq!(s.metrics().total_ticks, 5);
}

#[tokio::test(start_paused = true)]
async fn test_zero_rate_never_fires() {
    let mut s = TickScheduler::with_rate(0);
    let result = tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_jitter_stays_within_bound() {
    let mut s = TickScheduler::new(TickConfig {
        initial_jitter_us: 10_000,
        ..TickConfig::with_rate(20)
    });
    let start = tokio::time::Instant::now();
    s.wait_for_tick().await;
    let first = start.elapsed();
    assert!(first >= Duration::from_millis(50));
    assert!(first <= Duration::from_millis(61));
}

// =========================================================================
// Overrun policies
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_drops_missed_frames() {
    let mut s = TickScheduler::new(config_20hz(TickPolicy::Skip));
    s.wait_for_tick().await;

    // Stall for 160 ms: the next frame was due 50 ms after the first and
    // is now 110 ms late, two whole frames behind.
    tokio::time::advance(Duration::from_millis(160)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 2);

    // Rescheduled from now, so the following frame is on time.
    let info = s.wait_for_tick().await;
    assert!(!info.overrun);
    assert_eq!(s.metrics().total_overruns, 1);
    assert_eq!(s.metrics().total_skipped, 2);
}

#[tokio::test(start_paused = true)]
async fn test_catch_up_policy_fires_missed_frames_back_to_back() {
    let mut s = TickScheduler::new(config_20hz(TickPolicy::CatchUp { max_catchup: 3 }));
    s.wait_for_tick().await;

    tokio::time::advance(Duration::from_millis(160)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 0);

    // The next frame keeps the old schedule and is already due.
    let before = tokio::time::Instant::now();
    s.wait_for_tick().await;
    assert_eq!(tokio::time::Instant::now(), before);
}

#[tokio::test(start_paused = true)]
async fn test_catch_up_beyond_cap_skips_the_rest() {
    let mut s = TickScheduler::new(config_20hz(TickPolicy::CatchUp { max_catchup: 1 }));
    s.wait_for_tick().await;

    tokio::time::advance(Duration::from_millis(210)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 2);
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_keeps_original_schedule() {
    let mut s = TickScheduler::new(config_20hz(TickPolicy::Drop));
    s.wait_for_tick().await;

    tokio::time::advance(Duration::from_millis(160)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 0);
    // Still behind the original grid.
    assert!(s.wait_for_tick().await.overrun);
}

// =========================================================================
// Metrics
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_frame_is_noop() {
    let mut s = TickScheduler::new(config_20hz(TickPolicy::Skip));
    s.record_tick_end();
    assert_eq!(s.metrics().max_tick_time, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_max_tick_time_tracks_work() {
    let mut s = TickScheduler::new(config_20hz(TickPolicy::Skip));
    s.wait_for_tick().await;
    // Work time is measured on the wall clock.
    std::thread::sleep(Duration::from_micros(50));
    s.record_tick_end();
    assert!(s.metrics().max_tick_time > Duration::ZERO);
    assert!(s.metrics().avg_tick_time > Duration::ZERO);
}

// =========================================================================
// TickSource
// =========================================================================

async fn count_frames(source: &mut impl TickSource, max: u64) -> u64 {
    let mut n = 0;
    while n < max {
        let Some(_) = source.next_tick().await else {
            break;
        };
        source.end_tick();
        n += 1;
    }
    n
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_and_synthetic_ticks_drive_the_same_loop() {
    let mut scheduler = TickScheduler::new(config_20hz(TickPolicy::Skip));
    assert_eq!(count_frames(&mut scheduler, 4).await, 4);
    assert_eq!(scheduler.metrics().total_ticks, 4);

    let mut synthetic = SyntheticTicks::new(Duration::from_millis(16), 2);
    assert_eq!(count_frames(&mut synthetic, 4).await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut s = TickScheduler::new(config_20hz(TickPolicy::Skip));
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(1);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(160)).await;
        tx.send("gameOver").await.ok();
    });

    let mut frames = 0u64;
    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                assert_eq!(event, "gameOver");
                break;
            }
            info = s.wait_for_tick() => {
                frames += 1;
                assert_eq!(info.tick, frames);
                s.record_tick_end();
            }
        }
    }
    assert!(frames >= 3, "expected at least 3 frames, got {frames}");
}
