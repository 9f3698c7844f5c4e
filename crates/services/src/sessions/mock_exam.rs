use serde::Serialize;
use tracing::info;

use exam_core::model::{ExamKind, SessionOutcome, SessionStatus};

use super::driver::SessionDriver;
use crate::error::SessionError;

/// Result of one mock-exam section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub kind: ExamKind,
    pub title: String,
    pub outcome: Option<SessionOutcome>,
}

/// Combined result of a mock exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockExamReport {
    pub sections: Vec<SectionReport>,
}

impl MockExamReport {
    /// Sections that finished with a passing verdict.
    #[must_use]
    pub fn passed_sections(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| s.outcome.as_ref().is_some_and(SessionOutcome::passed))
            .count()
    }

    /// Passed iff every section finished and passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.sections.is_empty() && self.passed_sections() == self.sections.len()
    }
}

/// Sequence of sections taken one after another.
///
/// Each section is an ordinary session with its own countdown; the next one
/// becomes current only after the previous reached a terminal state.
pub struct MockExam {
    sections: Vec<SessionDriver>,
    current: usize,
}

impl MockExam {
    /// # Errors
    ///
    /// Returns `SessionError::EmptyMockExam` if `sections` is empty.
    pub fn new(sections: Vec<SessionDriver>) -> Result<Self, SessionError> {
        if sections.is_empty() {
            return Err(SessionError::EmptyMockExam);
        }
        Ok(Self {
            sections,
            current: 0,
        })
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> &SessionDriver {
        &self.sections[self.current]
    }

    pub fn current_mut(&mut self) -> &mut SessionDriver {
        &mut self.sections[self.current]
    }

    /// Move to the next section once the current one has finished.
    ///
    /// Returns `Ok(false)` when the current section was the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SectionUnfinished` while the current section is
    /// not terminal.
    pub fn next_section(&mut self) -> Result<bool, SessionError> {
        let status = self.current().status()?;
        if !status.is_terminal() {
            return Err(SessionError::SectionUnfinished {
                index: self.current,
                status,
            });
        }
        if self.current + 1 >= self.sections.len() {
            return Ok(false);
        }
        self.current += 1;
        info!(target: "session", section = self.current + 1, of = self.sections.len(), "Mock exam section");
        Ok(true)
    }

    /// Whether every section reached a terminal state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if a section lock is poisoned.
    pub fn is_finished(&self) -> Result<bool, SessionError> {
        for section in &self.sections {
            if !section.status()?.is_terminal() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Reset every section and go back to the first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if a section lock is poisoned.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        for section in &mut self.sections {
            section.reset()?;
        }
        self.current = 0;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if a section lock is poisoned.
    pub fn report(&self) -> Result<MockExamReport, SessionError> {
        let sections = self
            .sections
            .iter()
            .map(|section| {
                section.with_session(|s| SectionReport {
                    kind: s.config().kind,
                    title: s.config().title.clone(),
                    outcome: s.outcome().cloned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MockExamReport { sections })
    }

    /// Status of every section, in order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Poisoned` if a section lock is poisoned.
    pub fn statuses(&self) -> Result<Vec<SessionStatus>, SessionError> {
        self.sections.iter().map(SessionDriver::status).collect()
    }
}
