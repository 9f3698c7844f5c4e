//! Audio gating for listening questions.
//!
//! A question that carries an audio reference may only be answered after the
//! playback component reports that the clip played through to the end. The
//! session asks an `AudioGate`; the playback side tells a `PlaybackLog`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use exam_core::model::QuestionId;
use tracing::debug;

/// Answers whether a question's audio has finished playing at least once.
pub trait AudioGate: Send + Sync {
    fn has_played_to_completion(&self, question_id: QuestionId) -> bool;

    /// Called when the session is reset; a new attempt starts with every
    /// clip unplayed.
    fn reset(&self) {}
}

/// Shared record of finished playbacks.
///
/// Clones share the same log, so the player can keep one handle while the
/// session holds another.
#[derive(Debug, Clone, Default)]
pub struct PlaybackLog {
    finished: Arc<Mutex<HashSet<QuestionId>>>,
}

impl PlaybackLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the clip of `question_id` played to its end.
    pub fn mark_finished(&self, question_id: QuestionId) {
        if let Ok(mut finished) = self.finished.lock() {
            finished.insert(question_id);
            debug!(target: "session", %question_id, "Audio playback finished");
        }
    }

    /// Forgets every playback, e.g. when the session is reset.
    pub fn clear(&self) {
        if let Ok(mut finished) = self.finished.lock() {
            finished.clear();
        }
    }
}

impl AudioGate for PlaybackLog {
    fn has_played_to_completion(&self, question_id: QuestionId) -> bool {
        // A poisoned log keeps the gate closed.
        self.finished
            .lock()
            .map(|finished| finished.contains(&question_id))
            .unwrap_or(false)
    }

    fn reset(&self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_opens_only_for_finished_clips() {
        let log = PlaybackLog::new();
        let handle = log.clone();
        assert!(!log.has_played_to_completion(QuestionId::new(1)));

        handle.mark_finished(QuestionId::new(1));
        assert!(log.has_played_to_completion(QuestionId::new(1)));
        assert!(!log.has_played_to_completion(QuestionId::new(2)));

        log.clear();
        assert!(!handle.has_played_to_completion(QuestionId::new(1)));

        handle.mark_finished(QuestionId::new(2));
        let gate: &dyn AudioGate = &log;
        gate.reset();
        assert!(!handle.has_played_to_completion(QuestionId::new(2)));
    }
}
