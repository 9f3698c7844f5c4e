//! Shared error types for the services crate.

use std::fmt;
use thiserror::Error;

use exam_core::model::{
    ExamConfigError, ExamKind, MalformedBankError, QuestionId, ResponseKind, SessionStatus,
};
use storage::repository::SourceError;

/// Commands accepted by an exam session, named in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Tick,
    RecordAnswer,
    Advance,
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionCommand::Start => "start",
            SessionCommand::Tick => "tick",
            SessionCommand::RecordAnswer => "record an answer",
            SessionCommand::Advance => "advance",
        })
    }
}

/// Errors emitted by exam sessions and the services that drive them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    MalformedBank(#[from] MalformedBankError),

    #[error("question {question_id} cannot be answered before its audio has played")]
    GateNotSatisfied { question_id: QuestionId },

    #[error("cannot {command} while the session is {status}")]
    InvalidTransition {
        command: SessionCommand,
        status: SessionStatus,
    },

    #[error("question {question_id} expects a {expected} response, got {actual}")]
    ResponseMismatch {
        question_id: QuestionId,
        expected: ResponseKind,
        actual: ResponseKind,
    },

    #[error("no exam configured for {0}")]
    UnknownExam(ExamKind),

    #[error("mock exam has no sections")]
    EmptyMockExam,

    #[error("mock exam section {index} is still {status}")]
    SectionUnfinished { index: usize, status: SessionStatus },

    #[error(transparent)]
    Config(#[from] ExamConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("session state lock poisoned")]
    Poisoned,
}
