use std::sync::{Arc, Mutex, MutexGuard};

use exam_core::model::{Response, SessionOutcome, SessionSnapshot, SessionStatus};

use super::countdown::{ClockSource, CountdownHandle, IntervalClock, SharedSession, spawn_countdown};
use super::service::ExamSession;
use crate::error::SessionError;

/// Owns a session together with the countdown that ticks it.
///
/// Starting spawns the countdown; reaching a terminal state through
/// `advance()` or calling `reset()` stops it. All commands go through the
/// same lock the countdown uses.
pub struct SessionDriver {
    session: SharedSession,
    countdown: Option<CountdownHandle>,
}

impl SessionDriver {
    #[must_use]
    pub fn new(session: ExamSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            countdown: None,
        }
    }

    /// Another handle on the driven session.
    #[must_use]
    pub fn shared(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    /// Start the session with a one-second wall-clock countdown.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the session is not `NotStarted`.
    pub fn start(&mut self) -> Result<SessionSnapshot, SessionError> {
        self.start_with_clock(Box::new(IntervalClock::every_second()))
    }

    /// Start the session with a custom tick source.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the session is not `NotStarted`.
    pub fn start_with_clock(
        &mut self,
        clock: Box<dyn ClockSource>,
    ) -> Result<SessionSnapshot, SessionError> {
        let snapshot = {
            let mut session = self.lock()?;
            session.start()?;
            session.snapshot()
        };
        self.stop_countdown();
        self.countdown = Some(spawn_countdown(self.shared(), clock));
        Ok(snapshot)
    }

    /// # Errors
    ///
    /// See `ExamSession::record_answer`.
    pub fn record_answer(&self, response: Response) -> Result<(), SessionError> {
        self.lock()?.record_answer(response)
    }

    /// # Errors
    ///
    /// See `ExamSession::advance`.
    pub fn advance(&mut self) -> Result<SessionStatus, SessionError> {
        let status = self.lock()?.advance()?;
        if status.is_terminal() {
            self.stop_countdown();
        }
        Ok(status)
    }

    /// Stop the countdown and return the session to `NotStarted`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if the session lock is poisoned.
    pub fn reset(&mut self) -> Result<SessionSnapshot, SessionError> {
        self.stop_countdown();
        let mut session = self.lock()?;
        session.reset();
        Ok(session.snapshot())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if the session lock is poisoned.
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        Ok(self.lock()?.snapshot())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if the session lock is poisoned.
    pub fn status(&self) -> Result<SessionStatus, SessionError> {
        Ok(self.lock()?.status())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if the session lock is poisoned.
    pub fn outcome(&self) -> Result<Option<SessionOutcome>, SessionError> {
        Ok(self.lock()?.outcome().cloned())
    }

    /// Run `f` against the session under its lock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if the session lock is poisoned.
    pub fn with_session<R>(&self, f: impl FnOnce(&ExamSession) -> R) -> Result<R, SessionError> {
        let session = self.lock()?;
        Ok(f(&session))
    }

    #[must_use]
    pub fn is_counting_down(&self) -> bool {
        self.countdown.as_ref().is_some_and(CountdownHandle::is_running)
    }

    /// Hand over the countdown handle, e.g. to await it.
    pub fn take_countdown(&mut self) -> Option<CountdownHandle> {
        self.countdown.take()
    }

    fn stop_countdown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ExamSession>, SessionError> {
        self.session.lock().map_err(|_| SessionError::Poisoned)
    }
}
