//! Plain-text rendering of sessions and outcomes for the terminal.

use exam_core::format_clock;
use exam_core::model::{QuestionId, ResponseKind, SessionOutcome, SessionStatus, Verdict};
use services::ExamSession;

/// What the player needs to show the question on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub number: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub expects: ResponseKind,
    pub audio: Option<String>,
    pub answerable: bool,
    pub remaining_seconds: u32,
    pub lives: u32,
    pub streak: u32,
    pub score: u32,
    pub reward: u32,
    pub min_words: Option<u32>,
}

impl QuestionView {
    /// `None` unless the session has a question on screen.
    #[must_use]
    pub fn capture(session: &ExamSession) -> Option<Self> {
        let question = session.current_question()?;
        let progress = session.progress();
        Some(Self {
            id: question.id(),
            number: progress.question_number(),
            total: progress.total,
            prompt: question.prompt().as_str().to_owned(),
            options: question.options().map(<[String]>::to_vec).unwrap_or_default(),
            expects: question.expected_response(),
            audio: question.gate().map(|audio| audio.as_str().to_owned()),
            answerable: session.is_answerable(),
            remaining_seconds: session.remaining_seconds(),
            lives: session.lives(),
            streak: session.streak(),
            score: session.score(),
            reward: session.potential_reward(),
            min_words: question.min_words(),
        })
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "\n[{}/{}]  {}  lives {}  streak {}  score {}\n",
            self.number,
            self.total,
            format_clock(self.remaining_seconds),
            self.lives,
            self.streak,
            self.score,
        );
        if let Some(audio) = &self.audio {
            out.push_str(&format!("(audio: {audio})\n"));
        }
        out.push_str(&self.prompt);
        out.push('\n');
        match self.expects {
            ResponseKind::Choice => {
                for (i, option) in self.options.iter().enumerate() {
                    out.push_str(&format!("  {}. {option}\n", i + 1));
                }
                out.push_str(&format!("Answer 1-{} (+{} pts), empty line to skip", self.options.len(), self.reward));
            }
            ResponseKind::Text => match self.min_words {
                Some(min) => out.push_str(&format!("Type your answer on one line (at least {min} words)")),
                None => out.push_str("Type your answer on one line"),
            },
            ResponseKind::Recording => {
                out.push_str("Speak, then type what you said on one line");
            }
        }
        out
    }
}

#[must_use]
pub fn render_outcome(title: &str, outcome: &SessionOutcome) -> String {
    let status = match outcome.status {
        SessionStatus::Completed => "completed",
        SessionStatus::Failed => "out of lives",
        SessionStatus::TimedOut => "time is up",
        SessionStatus::NotStarted | SessionStatus::InProgress => "unfinished",
    };
    let verdict = match outcome.verdict {
        Verdict::Pass => "PASS",
        Verdict::Fail => "FAIL",
    };
    let stars = "*".repeat(usize::from(outcome.rating.stars));

    let mut out = format!("\n== {title}: {status} ==\n");
    out.push_str(&format!("Score        {} / {}\n", outcome.score, outcome.max_points));
    out.push_str(&format!(
        "Correct      {} / {} ({:.0}%)\n",
        outcome.correct_count, outcome.total_questions, outcome.percentage
    ));
    out.push_str(&format!("Best streak  {}\n", outcome.best_streak));
    if let Some(scaled) = outcome.scaled_points {
        out.push_str(&format!("Scaled       {scaled}\n"));
    }
    if let Some(band) = outcome.readiness {
        out.push_str(&format!("Readiness    {}%\n", band.probability_percent));
    }
    out.push_str(&format!("Rating       {} {stars}\n", outcome.rating.label));
    out.push_str(&format!("Verdict      {verdict}"));
    out
}
