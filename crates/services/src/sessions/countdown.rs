//! Drives `ExamSession::tick()` from a clock source on a background task.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use exam_core::model::SessionStatus;

use super::service::ExamSession;

/// Session shared between the countdown task and the caller.
pub type SharedSession = Arc<Mutex<ExamSession>>;

//
// ─── CLOCK SOURCES ─────────────────────────────────────────────────────────────
//

/// Produces the one-second ticks of a countdown.
#[async_trait]
pub trait ClockSource: Send {
    /// Wait for the next tick. Returns `false` once no more ticks will come.
    async fn next_tick(&mut self) -> bool;
}

/// Wall-clock ticks from a tokio interval.
///
/// The first tick fires one full period after the first call, never
/// immediately.
pub struct IntervalClock {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalClock {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    #[must_use]
    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl ClockSource for IntervalClock {
    async fn next_tick(&mut self) -> bool {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
        true
    }
}

/// Ticks delivered by hand through a `ManualTicker`, for tests and replays.
pub struct ManualClock {
    ticks: mpsc::UnboundedReceiver<()>,
}

/// Sending half of a `ManualClock`.
#[derive(Debug, Clone)]
pub struct ManualTicker {
    ticks: mpsc::UnboundedSender<()>,
}

impl ManualClock {
    #[must_use]
    pub fn channel() -> (ManualTicker, ManualClock) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ManualTicker { ticks: tx }, ManualClock { ticks: rx })
    }
}

impl ManualTicker {
    /// Queue one tick. Returns `false` if the clock has been dropped.
    pub fn tick(&self) -> bool {
        self.ticks.send(()).is_ok()
    }

    /// Queue `n` ticks.
    pub fn tick_n(&self, n: u32) -> bool {
        (0..n).all(|_| self.tick())
    }
}

#[async_trait]
impl ClockSource for ManualClock {
    async fn next_tick(&mut self) -> bool {
        self.ticks.recv().await.is_some()
    }
}

//
// ─── COUNTDOWN TASK ────────────────────────────────────────────────────────────
//

/// Why a countdown task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownExit {
    /// The session left `InProgress` (timed out, finished or was reset).
    SessionEnded(SessionStatus),
    /// The clock source stopped producing ticks.
    ClockStopped,
    /// The session lock was poisoned by a panicking holder.
    Poisoned,
}

/// Handle to a running countdown. Dropping it stops the countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    task: Option<JoinHandle<CountdownExit>>,
}

impl CountdownHandle {
    /// Stop the countdown without waiting for it.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(target: "countdown", "Countdown cancelled");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait for the countdown to stop on its own.
    ///
    /// Returns `None` if it was cancelled.
    pub async fn finished(mut self) -> Option<CountdownExit> {
        let task = self.task.take()?;
        task.await.ok()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a task that ticks `session` once per tick of `clock` until the
/// session leaves `InProgress`.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_countdown(session: SharedSession, clock: Box<dyn ClockSource>) -> CountdownHandle {
    CountdownHandle {
        task: Some(tokio::spawn(run_countdown(session, clock))),
    }
}

async fn run_countdown(session: SharedSession, mut clock: Box<dyn ClockSource>) -> CountdownExit {
    debug!(target: "countdown", "Countdown running");
    loop {
        if !clock.next_tick().await {
            debug!(target: "countdown", "Clock source stopped");
            return CountdownExit::ClockStopped;
        }
        if let Some(exit) = tick_shared(&session) {
            return exit;
        }
    }
}

fn tick_shared(session: &SharedSession) -> Option<CountdownExit> {
    let Ok(mut session) = session.lock() else {
        warn!(target: "countdown", "Session lock poisoned, stopping countdown");
        return Some(CountdownExit::Poisoned);
    };

    let status = session.status();
    if status != SessionStatus::InProgress {
        return Some(CountdownExit::SessionEnded(status));
    }

    match session.tick() {
        Ok(SessionStatus::InProgress) => None,
        Ok(status) => {
            info!(target: "countdown", %status, "Countdown finished");
            Some(CountdownExit::SessionEnded(status))
        }
        Err(err) => {
            warn!(target: "countdown", error = %err, "Tick rejected");
            Some(CountdownExit::SessionEnded(session.status()))
        }
    }
}
