use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::info;

use exam_core::Clock;
use exam_core::model::{BankId, ExamConfig, ExamKind, ExamTable, QuestionBank};
use storage::repository::QuestionSource;

use super::driver::SessionDriver;
use super::mock_exam::MockExam;
use super::service::ExamSession;
use crate::error::SessionError;
use crate::gate::AudioGate;
use crate::observer::SessionObserver;

/// Builds ready-to-start sessions from the exam table and a question source.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    source: Arc<dyn QuestionSource>,
    exams: ExamTable,
    shuffle: bool,
    shuffle_seed: Option<u64>,
    gate: Option<Arc<dyn AudioGate>>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, source: Arc<dyn QuestionSource>, exams: ExamTable) -> Self {
        Self {
            clock,
            source,
            exams,
            shuffle: false,
            shuffle_seed: None,
            gate: None,
            observers: Vec::new(),
        }
    }

    /// Shuffle each bank before the session picks its questions.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Shuffle deterministically from `seed`.
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.shuffle_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_audio_gate(mut self, gate: Arc<dyn AudioGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Attach `observer` to every session this service builds.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[must_use]
    pub fn exams(&self) -> &ExamTable {
        &self.exams
    }

    /// Load and validate a bank, shuffled if configured.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Source` if loading fails and
    /// `SessionError::MalformedBank` if the bank is empty or inconsistent.
    pub async fn load_bank(&self, bank_id: &BankId) -> Result<Arc<QuestionBank>, SessionError> {
        let mut questions = self.source.load(bank_id).await?;
        if self.shuffle {
            match self.shuffle_seed {
                Some(seed) => questions.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => questions.shuffle(&mut rand::rng()),
            }
        }
        let bank = QuestionBank::new(questions)?;
        info!(target: "session", %bank_id, questions = bank.len(), shuffled = self.shuffle, "Bank loaded");
        Ok(Arc::new(bank))
    }

    /// Build a `NotStarted` session for the configured exam of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownExam` if the table has no such exam, plus
    /// any error from `create_session_from`.
    pub async fn create_session(&self, kind: ExamKind) -> Result<ExamSession, SessionError> {
        let config = self
            .exams
            .get(kind)
            .cloned()
            .ok_or(SessionError::UnknownExam(kind))?;
        self.create_session_from(config).await
    }

    /// Build a `NotStarted` session for an explicit exam record.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for source, bank or config failures.
    pub async fn create_session_from(&self, config: ExamConfig) -> Result<ExamSession, SessionError> {
        let bank = self.load_bank(&config.bank_id).await?;
        let mut session = ExamSession::new(bank, config)?.with_clock(self.clock);
        if let Some(gate) = &self.gate {
            session = session.with_audio_gate(Arc::clone(gate));
        }
        for observer in &self.observers {
            session.add_observer(Arc::clone(observer));
        }
        Ok(session)
    }

    /// Build every section of the configured mock exam, in order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyMockExam` when no sections are configured,
    /// plus any error from building a section.
    pub async fn create_mock_exam(&self) -> Result<MockExam, SessionError> {
        let mut sections = Vec::with_capacity(self.exams.mock_exam.len());
        for config in &self.exams.mock_exam {
            let session = self.create_session_from(config.clone()).await?;
            sections.push(SessionDriver::new(session));
        }
        MockExam::new(sections)
    }
}
