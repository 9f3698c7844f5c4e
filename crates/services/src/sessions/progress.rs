/// How far a session has moved through its questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    /// Questions already scored (or abandoned by a terminal state).
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// 1-based number of the question on screen, capped at `total`.
    #[must_use]
    pub fn question_number(&self) -> usize {
        (self.answered + 1).min(self.total)
    }
}
