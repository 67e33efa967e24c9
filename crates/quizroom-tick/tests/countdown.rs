//! Integration tests for the countdown timer.
//!
//! Uses paused tokio time so `sleep_until` resolves as soon as every task
//! is idle, and elapsed time can be asserted exactly.

use std::time::Duration;

use quizroom_tick::{Countdown, DEFAULT_PERIOD};
use tokio::time::Instant;

// =========================================================================
// Construction
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_new_countdown_initial_state() {
    let c = Countdown::new(3, Duration::from_millis(100));
    assert_eq!(c.remaining(), 3);
    assert_eq!(c.ticks(), 0);
    assert!(!c.is_finished());
    assert_eq!(c.period(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_seconds_uses_default_period() {
    let c = Countdown::seconds(10);
    assert_eq!(c.period(), DEFAULT_PERIOD);
    assert_eq!(c.period(), Duration::from_secs(1));
}

// =========================================================================
// Emission order and timing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_emits_values_descending_then_none() {
    let mut c = Countdown::seconds(3);

    assert_eq!(c.next().await, Some(3));
    assert_eq!(c.next().await, Some(2));
    assert_eq!(c.next().await, Some(1));
    assert_eq!(c.next().await, None);
    assert!(c.is_finished());
    assert_eq!(c.ticks(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_first_value_arrives_after_one_period() {
    let start = Instant::now();
    let mut c = Countdown::seconds(5);

    c.next().await;
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_completes_one_period_after_last_value() {
    let start = Instant::now();
    let mut c = Countdown::seconds(3);

    while c.next().await.is_some() {}
    // 3 values plus the completing step.
    assert_eq!(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_zero_completes_after_one_period() {
    let start = Instant::now();
    let mut c = Countdown::seconds(0);

    assert_eq!(c.next().await, None);
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_custom_period_spacing() {
    let start = Instant::now();
    let mut c = Countdown::new(2, Duration::from_millis(20));

    assert_eq!(c.next().await, Some(2));
    assert_eq!(c.next().await, Some(1));
    assert_eq!(start.elapsed(), Duration::from_millis(40));
}

// =========================================================================
// After completion
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_finished_countdown_pends_forever() {
    let mut c = Countdown::seconds(1);
    while c.next().await.is_some() {}

    let result = tokio::time::timeout(Duration::from_secs(60), c.next()).await;
    assert!(result.is_err(), "finished countdown should never resolve");
}

// =========================================================================
// Integration: select! loop pattern (mirrors room usage)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_keeps_schedule_across_commands() {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(10);
    let mut c = Countdown::seconds(3);

    tokio::spawn(async move {
        // Lands between the first and second tick.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        tx.send("answer").await.ok();
    });

    let start = Instant::now();
    let mut seen = Vec::new();
    let mut commands = 0;
    loop {
        tokio::select! {
            Some(_) = rx.recv() => commands += 1,
            step = c.next() => match step {
                Some(remaining) => seen.push(remaining),
                None => break,
            },
        }
    }

    assert_eq!(commands, 1);
    assert_eq!(seen, vec![3, 2, 1]);
    assert_eq!(start.elapsed(), Duration::from_secs(4));
}
