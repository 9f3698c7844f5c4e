use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ids::QuestionId;
use crate::model::question::ResponseKind;

/// What the respondent produced for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Index into the question's options.
    Choice { index: usize },
    Text { text: String },
    /// Reference to recorded audio plus the word count derived from it.
    Recording { reference: String, word_count: u32 },
}

impl Response {
    #[must_use]
    pub fn choice(index: usize) -> Self {
        Self::Choice { index }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub fn recording(reference: impl Into<String>, word_count: u32) -> Self {
        Self::Recording {
            reference: reference.into(),
            word_count,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ResponseKind {
        match self {
            Response::Choice { .. } => ResponseKind::Choice,
            Response::Text { .. } => ResponseKind::Text,
            Response::Recording { .. } => ResponseKind::Recording,
        }
    }
}

/// A response bound to the question it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub response: Response,
}

impl Answer {
    #[must_use]
    pub fn new(question_id: QuestionId, response: Response) -> Self {
        Self {
            question_id,
            response,
        }
    }
}

/// Answers recorded during one attempt, at most one per question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    entries: HashMap<QuestionId, Response>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the answer, replacing any earlier one for the same question.
    ///
    /// Returns the replaced response, if any.
    pub fn record(&mut self, answer: Answer) -> Option<Response> {
        self.entries.insert(answer.question_id, answer.response)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Response> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.entries.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &Response)> {
        self.entries.iter().map(|(id, response)| (*id, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_overwrites_per_question() {
        let mut ledger = AnswerLedger::new();
        let id = QuestionId::new(7);

        assert_eq!(ledger.record(Answer::new(id, Response::choice(0))), None);
        let replaced = ledger.record(Answer::new(id, Response::choice(2)));

        assert_eq!(replaced, Some(Response::choice(0)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(id), Some(&Response::choice(2)));
    }

    #[test]
    fn response_kinds() {
        assert_eq!(Response::choice(1).kind(), ResponseKind::Choice);
        assert_eq!(Response::text("hoi").kind(), ResponseKind::Text);
        assert_eq!(Response::recording("rec-1.webm", 12).kind(), ResponseKind::Recording);
    }
}
