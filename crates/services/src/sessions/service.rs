use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use exam_core::Clock;
use exam_core::model::{
    Answer, AnswerLedger, AttemptId, ExamConfig, Question, QuestionBank, Response,
    SessionOutcome, SessionSnapshot, SessionStatus, TimeoutPolicy, Verdict,
};
use exam_core::scoring::{self, QuestionScore};

use super::progress::SessionProgress;
use crate::error::{SessionCommand, SessionError};
use crate::gate::{AudioGate, PlaybackLog};
use crate::observer::SessionObserver;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed attempt at an exam.
///
/// Walks the first `question_count` questions of the bank in order. Choice
/// questions feed the streak and cost a life when missed; free-form questions
/// only earn partial credit. The session ends `Completed` after the last
/// question, `Failed` when the lives run out and `TimedOut` when `tick()`
/// brings the countdown to zero. A timeout that costs the last life ends the
/// session `Failed`. Terminal sessions accept only `reset()`.
///
/// Every state change is pushed to the registered observers as a
/// `SessionSnapshot`.
pub struct ExamSession {
    attempt_id: AttemptId,
    bank: Arc<QuestionBank>,
    config: ExamConfig,
    total_questions: usize,
    max_points: u32,
    clock: Clock,
    gate: Arc<dyn AudioGate>,
    observers: Vec<Arc<dyn SessionObserver>>,
    status: SessionStatus,
    cursor: usize,
    scored: usize,
    answers: AnswerLedger,
    lives: u32,
    streak: u32,
    best_streak: u32,
    score: u32,
    correct_count: u32,
    remaining_seconds: u32,
    started_at: Option<DateTime<Utc>>,
    outcome: Option<SessionOutcome>,
}

impl ExamSession {
    /// Create a session in `NotStarted` for the given bank and exam record.
    ///
    /// Audio questions stay locked until a gate is supplied with
    /// `with_audio_gate` and reports the clip as played.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the exam record is invalid.
    pub fn new(bank: Arc<QuestionBank>, config: ExamConfig) -> Result<Self, SessionError> {
        config.validate()?;

        let total_questions = config
            .question_count
            .map_or(bank.len(), |count| count.min(bank.len()));
        let max_points = bank
            .iter()
            .take(total_questions)
            .fold(0_u32, |acc, q| acc.saturating_add(q.points()));

        Ok(Self {
            attempt_id: AttemptId::generate(),
            lives: config.starting_lives,
            remaining_seconds: config.total_seconds,
            bank,
            config,
            total_questions,
            max_points,
            clock: Clock::default(),
            gate: Arc::new(PlaybackLog::new()),
            observers: Vec::new(),
            status: SessionStatus::NotStarted,
            cursor: 0,
            scored: 0,
            answers: AnswerLedger::new(),
            streak: 0,
            best_streak: 0,
            score: 0,
            correct_count: 0,
            started_at: None,
            outcome: None,
        })
    }

    /// Validate `questions` as a bank and build a session over it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MalformedBank` for an empty or inconsistent
    /// bank and `SessionError::Config` for an invalid exam record.
    pub fn from_questions(questions: Vec<Question>, config: ExamConfig) -> Result<Self, SessionError> {
        Self::new(Arc::new(QuestionBank::new(questions)?), config)
    }

    /// Clock used to stamp `started_at`/`finished_at`.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_audio_gate(mut self, gate: Arc<dyn AudioGate>) -> Self {
        self.gate = gate;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Number of questions this session plays.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    /// Sum of the base points of every played question.
    #[must_use]
    pub fn max_points(&self) -> u32 {
        self.max_points
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerLedger {
        &self.answers
    }

    /// Question on screen; `None` unless the session is in progress.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.status == SessionStatus::InProgress {
            self.bank.get(self.cursor)
        } else {
            None
        }
    }

    /// Response recorded so far for the question on screen.
    #[must_use]
    pub fn current_response(&self) -> Option<&Response> {
        self.current_question()
            .and_then(|q| self.answers.get(q.id()))
    }

    /// Whether the question on screen can be answered right now.
    #[must_use]
    pub fn is_answerable(&self) -> bool {
        self.current_question().is_some_and(|q| self.gate_open(q))
    }

    /// Points a correct answer would add at the current streak.
    #[must_use]
    pub fn potential_reward(&self) -> u32 {
        self.current_question().map_or(0, |q| {
            scoring::choice_reward(q.points(), self.streak, self.config.streak_bonus_per_correct)
        })
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.scored;
        SessionProgress {
            total: self.total_questions,
            answered,
            remaining: self.total_questions.saturating_sub(answered),
            is_complete: self.status.is_terminal(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            cursor: self.cursor,
            lives: self.lives,
            streak: self.streak,
            score: self.score,
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// Final result; present once the session reached a terminal state.
    #[must_use]
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    //
    // ─── COMMANDS ──────────────────────────────────────────────────────────────
    //

    /// Begin the attempt and start counting down.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is `NotStarted`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.require(SessionStatus::NotStarted, SessionCommand::Start)?;

        self.status = SessionStatus::InProgress;
        self.started_at = Some(self.clock.now());
        info!(
            target: "session",
            attempt_id = %self.attempt_id,
            exam = %self.config.kind,
            questions = self.total_questions,
            seconds = self.config.total_seconds,
            "Session started"
        );
        self.notify();
        Ok(())
    }

    /// Remove one second from the countdown; at zero the session times out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is
    /// `InProgress`. The state is left untouched in that case.
    pub fn tick(&mut self) -> Result<SessionStatus, SessionError> {
        self.require(SessionStatus::InProgress, SessionCommand::Tick)?;

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.time_out();
        }
        self.notify();
        Ok(self.status)
    }

    /// Record (or replace) the response to the question on screen.
    ///
    /// Nothing is scored until `advance()`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless in progress,
    /// `SessionError::GateNotSatisfied` while the question's audio has not
    /// played to the end, and `SessionError::ResponseMismatch` when the
    /// response shape does not fit the question. The ledger is unchanged on error.
    pub fn record_answer(&mut self, response: Response) -> Result<(), SessionError> {
        self.require(SessionStatus::InProgress, SessionCommand::RecordAnswer)?;
        let Some(question) = self.bank.get(self.cursor) else {
            return Err(self.invalid(SessionCommand::RecordAnswer));
        };

        if !self.gate_open(question) {
            return Err(SessionError::GateNotSatisfied {
                question_id: question.id(),
            });
        }
        let expected = question.expected_response();
        if response.kind() != expected {
            return Err(SessionError::ResponseMismatch {
                question_id: question.id(),
                expected,
                actual: response.kind(),
            });
        }

        let question_id = question.id();
        let replaced = self.answers.record(Answer::new(question_id, response));
        debug!(target: "session", %question_id, replaced = replaced.is_some(), "Answer recorded");
        Ok(())
    }

    /// Score the question on screen and move on.
    ///
    /// Running out of lives ends the session `Failed` before completion is
    /// considered; passing the last question ends it `Completed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is `InProgress`.
    pub fn advance(&mut self) -> Result<SessionStatus, SessionError> {
        self.require(SessionStatus::InProgress, SessionCommand::Advance)?;

        self.score_current();
        if self.lives == 0 {
            self.finalize(SessionStatus::Failed);
        } else if self.cursor + 1 >= self.total_questions {
            self.finalize(SessionStatus::Completed);
        } else {
            self.cursor += 1;
        }
        self.notify();
        Ok(self.status)
    }

    /// Return to `NotStarted` with every counter at its initial value.
    ///
    /// Allowed from any state; a fresh attempt id is drawn and the audio gate
    /// forgets earlier playbacks.
    pub fn reset(&mut self) {
        self.attempt_id = AttemptId::generate();
        self.gate.reset();
        self.status = SessionStatus::NotStarted;
        self.cursor = 0;
        self.scored = 0;
        self.answers.clear();
        self.lives = self.config.starting_lives;
        self.streak = 0;
        self.best_streak = 0;
        self.score = 0;
        self.correct_count = 0;
        self.remaining_seconds = self.config.total_seconds;
        self.started_at = None;
        self.outcome = None;
        debug!(target: "session", exam = %self.config.kind, "Session reset");
        self.notify();
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn require(&self, expected: SessionStatus, command: SessionCommand) -> Result<(), SessionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(self.invalid(command))
        }
    }

    fn invalid(&self, command: SessionCommand) -> SessionError {
        warn!(target: "session", %command, status = %self.status, "Rejected command");
        SessionError::InvalidTransition {
            command,
            status: self.status,
        }
    }

    fn gate_open(&self, question: &Question) -> bool {
        question.gate().is_none() || self.gate.has_played_to_completion(question.id())
    }

    fn score_current(&mut self) {
        let Some(question) = self.bank.get(self.cursor) else {
            return;
        };
        self.scored += 1;
        let judged = scoring::score_question(
            question,
            self.answers.get(question.id()),
            self.streak,
            self.config.streak_bonus_per_correct,
            &self.config.free_form,
        );

        match judged {
            QuestionScore::Correct { reward } => {
                self.score = self.score.saturating_add(reward);
                self.correct_count += 1;
                self.streak += 1;
                self.best_streak = self.best_streak.max(self.streak);
            }
            QuestionScore::Incorrect => {
                self.streak = 0;
                self.lives = self.lives.saturating_sub(1);
            }
            QuestionScore::Credited { reward } => {
                self.score = self.score.saturating_add(reward);
            }
        }
        debug!(
            target: "session",
            question_id = %question.id(),
            reward = judged.reward(),
            lives = self.lives,
            streak = self.streak,
            "Question scored"
        );
    }

    fn time_out(&mut self) {
        self.remaining_seconds = 0;
        match self.config.timeout_policy {
            TimeoutPolicy::SubmitPending => self.score_current(),
            TimeoutPolicy::Forfeit => {}
        }
        // Running out of lives outranks running out of time.
        let status = if self.lives == 0 {
            SessionStatus::Failed
        } else {
            SessionStatus::TimedOut
        };
        self.finalize(status);
    }

    fn finalize(&mut self, status: SessionStatus) {
        self.status = status;

        let total = u32::try_from(self.total_questions).unwrap_or(u32::MAX);
        let rule = &self.config.pass_rule;
        let forfeited =
            status == SessionStatus::TimedOut && self.config.timeout_policy == TimeoutPolicy::Forfeit;
        let verdict = if forfeited {
            Verdict::Fail
        } else {
            Verdict::from_passed(scoring::is_passed(rule, self.score, self.correct_count, total))
        };
        let rating_pct = scoring::rating_percentage(
            self.config.rating.basis,
            self.score,
            self.max_points,
            self.correct_count,
            total,
        );
        let finished_at = self.clock.now();

        let outcome = SessionOutcome {
            attempt_id: self.attempt_id,
            status,
            score: self.score,
            max_points: self.max_points,
            correct_count: self.correct_count,
            total_questions: total,
            best_streak: self.best_streak,
            percentage: scoring::percentage(self.correct_count, total),
            scaled_points: scoring::scaled_for_rule(rule, self.correct_count, total),
            verdict,
            rating: scoring::rate(&self.config.rating, rating_pct),
            readiness: scoring::readiness(&self.config.readiness, self.correct_count),
            started_at: self.started_at.unwrap_or(finished_at),
            finished_at,
        };
        info!(
            target: "session",
            attempt_id = %self.attempt_id,
            exam = %self.config.kind,
            %status,
            score = outcome.score,
            correct = outcome.correct_count,
            passed = outcome.passed(),
            "Session finished"
        );
        self.outcome = Some(outcome);
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        for observer in &self.observers {
            observer.on_snapshot(&snapshot);
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
