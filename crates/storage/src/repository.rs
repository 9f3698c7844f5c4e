use async_trait::async_trait;
use exam_core::model::{
    AudioRef, BankId, Prompt, Question, QuestionId, QuestionKind, WritingTask,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by question sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("question bank {0} not found")]
    NotFound(BankId),

    #[error("question source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid question record {id}: {reason}")]
    InvalidRecord { id: u64, reason: &'static str },

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    AudioComprehension,
    FreeText,
    SpokenResponse,
}

/// Flat, serialisable shape of a question.
///
/// Mirrors the domain `Question` so bank files can be read and written without
/// leaking format concerns into the domain layer. Structural checks (option
/// bounds, unique ids) are left to `QuestionBank::new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<usize>,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_words: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<WritingTask>,
}

fn default_points() -> u32 {
    exam_core::model::DEFAULT_POINTS
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        let (kind, options, correct, audio) = match question.kind() {
            QuestionKind::MultipleChoice {
                options,
                correct_index,
            } => (
                QuestionType::MultipleChoice,
                options.clone(),
                Some(*correct_index),
                None,
            ),
            QuestionKind::AudioComprehension {
                options,
                correct_index,
                audio,
            } => (
                QuestionType::AudioComprehension,
                options.clone(),
                Some(*correct_index),
                Some(audio.as_str().to_owned()),
            ),
            QuestionKind::FreeText { .. } => (QuestionType::FreeText, Vec::new(), None, None),
            QuestionKind::SpokenResponse { .. } => {
                (QuestionType::SpokenResponse, Vec::new(), None, None)
            }
        };

        Self {
            id: question.id().value(),
            kind,
            prompt: question.prompt().as_str().to_owned(),
            prompt_audio: question.prompt().audio().map(|a| a.as_str().to_owned()),
            audio,
            options,
            correct,
            points: question.points(),
            category: question.category().to_owned(),
            min_words: question.min_words(),
            sample_answer: question.sample_answer().map(str::to_owned),
            task: question.task(),
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InvalidRecord` when a choice record has no
    /// `correct` index or an audio record has no `audio` reference.
    pub fn into_question(self) -> Result<Question, SourceError> {
        let id = self.id;
        let kind = match self.kind {
            QuestionType::MultipleChoice => QuestionKind::MultipleChoice {
                correct_index: self.correct.ok_or(SourceError::InvalidRecord {
                    id,
                    reason: "missing correct option",
                })?,
                options: self.options,
            },
            QuestionType::AudioComprehension => QuestionKind::AudioComprehension {
                correct_index: self.correct.ok_or(SourceError::InvalidRecord {
                    id,
                    reason: "missing correct option",
                })?,
                audio: self
                    .audio
                    .filter(|a| !a.trim().is_empty())
                    .map(AudioRef::new)
                    .ok_or(SourceError::InvalidRecord {
                        id,
                        reason: "missing audio reference",
                    })?,
                options: self.options,
            },
            QuestionType::FreeText => QuestionKind::FreeText {
                min_words: self.min_words,
                sample_answer: self.sample_answer,
                task: self.task,
            },
            QuestionType::SpokenResponse => QuestionKind::SpokenResponse {
                min_words: self.min_words,
                sample_answer: self.sample_answer,
            },
        };

        let mut prompt = Prompt::text(self.prompt);
        if let Some(audio) = self.prompt_audio {
            prompt = prompt.with_audio(AudioRef::new(audio));
        } else if let QuestionKind::AudioComprehension { audio, .. } = &kind {
            prompt = prompt.with_audio(audio.clone());
        }

        Ok(Question::new(QuestionId::new(id), prompt, kind)
            .with_points(self.points)
            .with_category(self.category))
    }
}

//
// ─── SOURCE CONTRACT ───────────────────────────────────────────────────────────
//

/// Supplies the questions of a bank, in order.
///
/// An empty result is passed through unchanged; rejecting it is the caller's
/// job (`QuestionBank::new`).
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Load every question of the given bank.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::NotFound` for unknown banks, or other source errors.
    async fn load(&self, bank_id: &BankId) -> Result<Vec<Question>, SourceError>;
}

/// Simple in-memory source for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryQuestionSource {
    banks: Arc<Mutex<HashMap<BankId, Vec<Question>>>>,
}

impl InMemoryQuestionSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a bank.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Unavailable` if the store lock is poisoned.
    pub fn insert_bank(&self, bank_id: BankId, questions: Vec<Question>) -> Result<(), SourceError> {
        let mut guard = self
            .banks
            .lock()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        guard.insert(bank_id, questions);
        Ok(())
    }
}

#[async_trait]
impl QuestionSource for InMemoryQuestionSource {
    async fn load(&self, bank_id: &BankId) -> Result<Vec<Question>, SourceError> {
        let guard = self
            .banks
            .lock()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        let questions = guard
            .get(bank_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(bank_id.clone()))?;
        debug!(target: "question_source", %bank_id, count = questions.len(), "Loaded bank from memory");
        Ok(questions)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_record() -> QuestionRecord {
        QuestionRecord {
            id: 4,
            kind: QuestionType::AudioComprehension,
            prompt: "Waarom is de winkel gesloten?".into(),
            prompt_audio: None,
            audio: Some("winkel.mp3".into()),
            options: vec!["Vakantie".into(), "Ziekte".into()],
            correct: Some(1),
            points: 10,
            category: "Luisteren".into(),
            min_words: None,
            sample_answer: None,
            task: None,
        }
    }

    #[test]
    fn audio_record_becomes_gated_question() {
        let q = audio_record().into_question().unwrap();
        assert_eq!(q.id(), QuestionId::new(4));
        assert_eq!(q.gate().map(AudioRef::as_str), Some("winkel.mp3"));
        assert_eq!(q.prompt().audio().map(AudioRef::as_str), Some("winkel.mp3"));
        assert_eq!(q.correct_index(), Some(1));
    }

    #[test]
    fn record_shape_survives_domain_conversion() {
        let q = audio_record().into_question().unwrap();
        let back = QuestionRecord::from_question(&q);
        let mut expected = audio_record();
        expected.prompt_audio = Some("winkel.mp3".into());
        assert_eq!(back, expected);
    }

    #[test]
    fn free_text_record_keeps_its_writing_task() {
        let mut record = audio_record();
        record.kind = QuestionType::FreeText;
        record.audio = None;
        record.options = Vec::new();
        record.correct = None;
        record.min_words = Some(30);
        record.task = Some(WritingTask::Email);

        let q = record.clone().into_question().unwrap();
        assert_eq!(q.task(), Some(WritingTask::Email));
        assert_eq!(QuestionRecord::from_question(&q), record);
    }

    #[test]
    fn choice_without_correct_index_is_invalid() {
        let mut record = audio_record();
        record.kind = QuestionType::MultipleChoice;
        record.correct = None;
        let err = record.into_question().unwrap_err();
        assert!(matches!(err, SourceError::InvalidRecord { id: 4, .. }));
    }

    #[test]
    fn audio_question_requires_audio() {
        let mut record = audio_record();
        record.audio = Some("  ".into());
        assert!(matches!(
            record.into_question(),
            Err(SourceError::InvalidRecord { .. })
        ));
    }
}
