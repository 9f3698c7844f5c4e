use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Structural problems that make a bank unusable for a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MalformedBankError {
    #[error("question bank is empty")]
    Empty,

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error("question {id} has {count} options, at least 2 are required")]
    TooFewOptions { id: QuestionId, count: usize },

    #[error("question {id} marks option {index} correct but only has {len} options")]
    CorrectIndexOutOfBounds {
        id: QuestionId,
        index: usize,
        len: usize,
    },

    #[error("question {0} is worth zero points")]
    ZeroPoints(QuestionId),
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Immutable, ordered and validated sequence of questions.
///
/// Construction is the only place a bank is checked; a `QuestionBank` value is
/// always non-empty with unique ids and in-bounds `correct_index` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Validates and wraps the given questions, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `MalformedBankError` for an empty list, duplicate ids, choice
    /// questions with fewer than two options or an out-of-range correct index,
    /// and questions worth zero points.
    pub fn new(questions: Vec<Question>) -> Result<Self, MalformedBankError> {
        if questions.is_empty() {
            return Err(MalformedBankError::Empty);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            let id = question.id();
            if !seen.insert(id) {
                return Err(MalformedBankError::DuplicateId(id));
            }
            if question.points() == 0 {
                return Err(MalformedBankError::ZeroPoints(id));
            }
            if let (Some(options), Some(index)) = (question.options(), question.correct_index()) {
                if options.len() < 2 {
                    return Err(MalformedBankError::TooFewOptions {
                        id,
                        count: options.len(),
                    });
                }
                if index >= options.len() {
                    return Err(MalformedBankError::CorrectIndexOutOfBounds {
                        id,
                        index,
                        len: options.len(),
                    });
                }
            }
        }

        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a constructed bank; kept for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Consumes the bank, handing back the questions (e.g. to reorder them).
    #[must_use]
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
