use std::sync::{Arc, Mutex};

use exam_core::model::SessionSnapshot;
use tracing::debug;

/// Receives a snapshot after every state change of a session.
///
/// Observers run synchronously on the thread that mutated the session and
/// must not call back into it.
pub trait SessionObserver: Send + Sync {
    fn on_snapshot(&self, snapshot: &SessionSnapshot);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionSnapshot) + Send + Sync,
{
    fn on_snapshot(&self, snapshot: &SessionSnapshot) {
        self(snapshot);
    }
}

/// Logs every snapshot at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_snapshot(&self, snapshot: &SessionSnapshot) {
        debug!(
            target: "session",
            status = %snapshot.status,
            cursor = snapshot.cursor,
            lives = snapshot.lives,
            streak = snapshot.streak,
            score = snapshot.score,
            remaining_seconds = snapshot.remaining_seconds,
            "Session snapshot"
        );
    }
}

/// Keeps every snapshot it sees, in order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    seen: Arc<Mutex<Vec<SessionSnapshot>>>,
}

impl SnapshotRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<SessionSnapshot> {
        self.seen.lock().ok().and_then(|seen| seen.last().copied())
    }
}

impl SessionObserver for SnapshotRecorder {
    fn on_snapshot(&self, snapshot: &SessionSnapshot) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(*snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::SessionStatus;

    fn snapshot(score: u32) -> SessionSnapshot {
        SessionSnapshot {
            status: SessionStatus::InProgress,
            cursor: 0,
            lives: 3,
            streak: 0,
            score,
            remaining_seconds: 60,
        }
    }

    #[test]
    fn recorder_keeps_snapshots_in_order() {
        let recorder = SnapshotRecorder::new();
        let observer: Arc<dyn SessionObserver> = Arc::new(recorder.clone());
        observer.on_snapshot(&snapshot(10));
        observer.on_snapshot(&snapshot(25));

        let scores: Vec<u32> = recorder.snapshots().iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![10, 25]);
        assert_eq!(recorder.last().map(|s| s.score), Some(25));
    }

    #[test]
    fn closures_are_observers() {
        let seen = Arc::new(Mutex::new(0u32));
        let sink = Arc::clone(&seen);
        let observer = move |s: &SessionSnapshot| *sink.lock().unwrap() += s.score;
        observer.on_snapshot(&snapshot(7));
        observer.on_snapshot(&snapshot(3));
        assert_eq!(*seen.lock().unwrap(), 10);
    }
}
