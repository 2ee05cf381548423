//! Integration tests for the turn-clock schedule.
//!
//! All tests run with `start_paused = true`: tokio's clock is frozen and
//! auto-advances to the next timer deadline only when every task is
//! parked. Awaiting the tick channel therefore jumps straight to the next
//! scheduled tick, while explicit `advance` + `try_recv` lets us assert
//! that a tick did *not* fire inside a window.

use std::time::Duration;

use tempo_clock::TurnClock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{self, Instant};

const PERIOD: Duration = Duration::from_secs(1);

fn tick_channel() -> (UnboundedSender<u64>, UnboundedReceiver<u64>) {
    mpsc::unbounded_channel()
}

/// Gives the clock task a chance to run after an explicit time advance.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// =========================================================================
// Construction and state
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_new_clock_is_stopped() {
    let clock = TurnClock::new(PERIOD);
    assert!(!clock.is_running());
    assert_eq!(clock.epoch(), 0);
    assert_eq!(clock.period(), PERIOD);
}

#[tokio::test(start_paused = true)]
async fn test_restart_returns_increasing_epochs() {
    let mut clock = TurnClock::new(PERIOD);
    let (tx, _rx) = tick_channel();

    let e1 = clock.restart({
        let tx = tx.clone();
        move |e| {
            let _ = tx.send(e);
        }
    });
    let e2 = clock.restart(move |e| {
        let _ = tx.send(e);
    });

    assert_eq!(e1, 1);
    assert_eq!(e2, 2);
    assert_eq!(clock.epoch(), 2);
    assert!(clock.is_running());
}

// =========================================================================
// Cadence
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_tick_fires_one_full_period_after_start() {
    let mut clock = TurnClock::new(PERIOD);
    let (tx, mut rx) = tick_channel();
    let start = Instant::now();

    clock.restart(move |e| {
        let _ = tx.send(e);
    });

    let epoch = rx.recv().await.expect("tick should fire");
    assert_eq!(epoch, 1);
    assert_eq!(start.elapsed(), PERIOD);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_fire_once_per_period() {
    let mut clock = TurnClock::new(PERIOD);
    let (tx, mut rx) = tick_channel();
    let start = Instant::now();

    clock.restart(move |e| {
        let _ = tx.send(e);
    });

    for n in 1..=3u32 {
        rx.recv().await.expect("tick should fire");
        assert_eq!(start.elapsed(), PERIOD * n);
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_tick_before_period_elapses() {
    let mut clock = TurnClock::new(PERIOD);
    let (tx, mut rx) = tick_channel();

    clock.restart(move |e| {
        let _ = tx.send(e);
    });

    time::advance(Duration::from_millis(900)).await;
    settle().await;
    assert!(rx.try_recv().is_err(), "tick fired before the period elapsed");
}

// =========================================================================
// Reset semantics: restart cancels the old schedule entirely
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_restart_buys_a_full_fresh_period() {
    let mut clock = TurnClock::new(PERIOD);
    let (tx, mut rx) = tick_channel();
    let start = Instant::now();

    clock.restart({
        let tx = tx.clone();
        move |e| {
            let _ = tx.send(e);
        }
    });

    // 0.9s into the first period: no tick yet. Restart.
    time::advance(Duration::from_millis(900)).await;
    settle().await;
    assert!(rx.try_recv().is_err());

    clock.restart(move |e| {
        let _ = tx.send(e);
    });

    // Another 0.9s: still nothing — the old 1.0s deadline is gone.
    time::advance(Duration::from_millis(900)).await;
    settle().await;
    assert!(
        rx.try_recv().is_err(),
        "old schedule's deadline survived the restart"
    );

    // The next tick lands a full period after the restart, at t = 1.9s,
    // and carries the new schedule's epoch.
    let epoch = rx.recv().await.expect("tick should fire");
    assert_eq!(epoch, 2);
    assert_eq!(start.elapsed(), Duration::from_millis(1900));
}

#[tokio::test(start_paused = true)]
async fn test_ticks_carry_their_schedules_epoch() {
    let mut clock = TurnClock::new(PERIOD);
    let (tx, mut rx) = tick_channel();

    clock.restart({
        let tx = tx.clone();
        move |e| {
            let _ = tx.send(e);
        }
    });
    let first = rx.recv().await.unwrap();
    assert_eq!(first, 1);

    clock.restart(move |e| {
        let _ = tx.send(e);
    });
    let second = rx.recv().await.unwrap();
    assert_eq!(second, 2, "new schedule must tick with the new epoch");
}

// =========================================================================
// Stopping
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_silences_the_clock() {
    let mut clock = TurnClock::new(PERIOD);
    let (tx, mut rx) = tick_channel();

    clock.restart(move |e| {
        let _ = tx.send(e);
    });
    clock.stop();
    assert!(!clock.is_running());

    time::advance(PERIOD * 5).await;
    settle().await;
    assert!(rx.try_recv().is_err(), "stopped clock still ticked");
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let mut clock = TurnClock::new(PERIOD);
    clock.stop();
    clock.stop();
    assert!(!clock.is_running());

    let (tx, _rx) = tick_channel();
    clock.restart(move |e| {
        let _ = tx.send(e);
    });
    clock.stop();
    clock.stop();
    assert!(!clock.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_drop_aborts_the_schedule() {
    let (tx, mut rx) = tick_channel();
    {
        let mut clock = TurnClock::new(PERIOD);
        clock.restart(move |e| {
            let _ = tx.send(e);
        });
    }
    // The task owned the only sender; once aborted, the channel closes
    // without ever delivering a tick.
    assert_eq!(rx.recv().await, None);
}
