use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::QuestionId;

/// Base value of a question when the bank does not say otherwise.
pub const DEFAULT_POINTS: u32 = 10;

//
// ─── AUDIO REFERENCE ───────────────────────────────────────────────────────────
//

/// Opaque reference to an audio fragment (file name, URL, synthesis text key).
///
/// The engine never resolves it; playback belongs to an external component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioRef(String);

impl AudioRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//
// ─── PROMPT ────────────────────────────────────────────────────────────────────
//

/// What the respondent is shown: text, optionally paired with an audio fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
    audio: Option<AudioRef>,
}

impl Prompt {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio: None,
        }
    }

    #[must_use]
    pub fn with_audio(mut self, audio: AudioRef) -> Self {
        self.audio = Some(audio);
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn audio(&self) -> Option<&AudioRef> {
        self.audio.as_ref()
    }
}

//
// ─── VARIANTS ──────────────────────────────────────────────────────────────────
//

/// Variant-specific payload of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct_index: usize,
    },
    /// Choice question that may only be answered once `audio` has been played
    /// to completion at least once.
    AudioComprehension {
        options: Vec<String>,
        correct_index: usize,
        audio: AudioRef,
    },
    FreeText {
        min_words: Option<u32>,
        sample_answer: Option<String>,
        task: Option<WritingTask>,
    },
    SpokenResponse {
        min_words: Option<u32>,
        sample_answer: Option<String>,
    },
}

/// Kind of writing task a free-text question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingTask {
    /// A letter or e-mail to someone.
    Email,
    /// A short piece of running text.
    Text,
    /// Filling in a form.
    Form,
}

/// Shape of response a question accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Choice,
    Text,
    Recording,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseKind::Choice => f.write_str("choice"),
            ResponseKind::Text => f.write_str("text"),
            ResponseKind::Recording => f.write_str("recording"),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single item of a question bank.
///
/// Questions are plain values; structural checks (unique ids, option bounds)
/// happen when a `QuestionBank` is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: Prompt,
    points: u32,
    category: String,
    kind: QuestionKind,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, prompt: Prompt, kind: QuestionKind) -> Self {
        Self {
            id,
            prompt,
            points: DEFAULT_POINTS,
            category: String::new(),
            kind,
        }
    }

    #[must_use]
    pub fn multiple_choice(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self::new(
            id,
            Prompt::text(prompt),
            QuestionKind::MultipleChoice {
                options,
                correct_index,
            },
        )
    }

    #[must_use]
    pub fn audio_comprehension(
        id: QuestionId,
        prompt: impl Into<String>,
        audio: AudioRef,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self::new(
            id,
            Prompt::text(prompt).with_audio(audio.clone()),
            QuestionKind::AudioComprehension {
                options,
                correct_index,
                audio,
            },
        )
    }

    #[must_use]
    pub fn free_text(id: QuestionId, prompt: impl Into<String>) -> Self {
        Self::new(
            id,
            Prompt::text(prompt),
            QuestionKind::FreeText {
                min_words: None,
                sample_answer: None,
                task: None,
            },
        )
    }

    #[must_use]
    pub fn spoken_response(id: QuestionId, prompt: impl Into<String>) -> Self {
        Self::new(
            id,
            Prompt::text(prompt),
            QuestionKind::SpokenResponse {
                min_words: None,
                sample_answer: None,
            },
        )
    }

    #[must_use]
    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the minimum word count of a free-form question. Ignored for choice variants.
    #[must_use]
    pub fn with_min_words(mut self, words: u32) -> Self {
        match &mut self.kind {
            QuestionKind::FreeText { min_words, .. }
            | QuestionKind::SpokenResponse { min_words, .. } => *min_words = Some(words),
            _ => {}
        }
        self
    }

    /// Sets the writing task of a free-text question. Ignored for other variants.
    #[must_use]
    pub fn with_task(mut self, writing_task: WritingTask) -> Self {
        if let QuestionKind::FreeText { task, .. } = &mut self.kind {
            *task = Some(writing_task);
        }
        self
    }

    /// Sets the reference answer of a free-form question. Ignored for choice variants.
    #[must_use]
    pub fn with_sample_answer(mut self, sample: impl Into<String>) -> Self {
        match &mut self.kind {
            QuestionKind::FreeText { sample_answer, .. }
            | QuestionKind::SpokenResponse { sample_answer, .. } => {
                *sample_answer = Some(sample.into());
            }
            _ => {}
        }
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    /// Options of a choice question, `None` for free-form variants.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. }
            | QuestionKind::AudioComprehension { options, .. } => Some(options),
            _ => None,
        }
    }

    #[must_use]
    pub fn correct_index(&self) -> Option<usize> {
        match &self.kind {
            QuestionKind::MultipleChoice { correct_index, .. }
            | QuestionKind::AudioComprehension { correct_index, .. } => Some(*correct_index),
            _ => None,
        }
    }

    #[must_use]
    pub fn min_words(&self) -> Option<u32> {
        match &self.kind {
            QuestionKind::FreeText { min_words, .. }
            | QuestionKind::SpokenResponse { min_words, .. } => *min_words,
            _ => None,
        }
    }

    #[must_use]
    pub fn sample_answer(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::FreeText { sample_answer, .. }
            | QuestionKind::SpokenResponse { sample_answer, .. } => sample_answer.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn task(&self) -> Option<WritingTask> {
        match &self.kind {
            QuestionKind::FreeText { task, .. } => *task,
            _ => None,
        }
    }

    /// Audio that must be played to completion before this question accepts an answer.
    #[must_use]
    pub fn gate(&self) -> Option<&AudioRef> {
        match &self.kind {
            QuestionKind::AudioComprehension { audio, .. } => Some(audio),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_choice(&self) -> bool {
        self.options().is_some()
    }

    #[must_use]
    pub fn expected_response(&self) -> ResponseKind {
        match self.kind {
            QuestionKind::MultipleChoice { .. } | QuestionKind::AudioComprehension { .. } => {
                ResponseKind::Choice
            }
            QuestionKind::FreeText { .. } => ResponseKind::Text,
            QuestionKind::SpokenResponse { .. } => ResponseKind::Recording,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
