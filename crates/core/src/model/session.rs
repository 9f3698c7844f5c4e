use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::exam::ReadinessBand;
use crate::model::ids::AttemptId;

/// Lifecycle state of an exam session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
    TimedOut,
}

impl SessionStatus {
    /// `Completed`, `Failed` and `TimedOut` accept nothing but a reset.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::TimedOut
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not_started",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What observers receive after every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub cursor: usize,
    pub lives: u32,
    pub streak: u32,
    pub score: u32,
    pub remaining_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    #[must_use]
    pub fn from_passed(passed: bool) -> Self {
        if passed { Verdict::Pass } else { Verdict::Fail }
    }

    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Feedback tier picked from an exam's rating table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub label: String,
    pub stars: u8,
}

/// Finalized result of a session that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub attempt_id: AttemptId,
    pub status: SessionStatus,
    pub score: u32,
    pub max_points: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    pub best_streak: u32,
    pub percentage: f64,
    pub scaled_points: Option<u32>,
    pub verdict: Verdict,
    pub rating: Rating,
    pub readiness: Option<ReadinessBand>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }

    /// Wall-clock length of the attempt.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!SessionStatus::NotStarted.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(SessionStatus::TimedOut.is_terminal());
    }

    #[test]
    fn verdict_from_bool() {
        assert_eq!(Verdict::from_passed(true), Verdict::Pass);
        assert!(!Verdict::from_passed(false).is_pass());
    }
}
