use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::model::ids::BankId;
use crate::model::question::WritingTask;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamConfigError {
    #[error("{kind}: total seconds must be > 0")]
    InvalidTotalSeconds { kind: ExamKind },

    #[error("{kind}: starting lives must be > 0")]
    InvalidStartingLives { kind: ExamKind },

    #[error("{kind}: question count must be > 0 when set")]
    InvalidQuestionCount { kind: ExamKind },

    #[error("{kind}: attempt credit must be between 0 and 100 percent")]
    InvalidAttemptCredit { kind: ExamKind },

    #[error("{kind}: rating table is empty")]
    EmptyRatingTable { kind: ExamKind },

    #[error("{kind}: lowest rating tier must start at 0%")]
    RatingTableHasNoFloor { kind: ExamKind },

    #[error("{kind}: scaled pass mark {pass} is outside {floor}..={ceiling}")]
    ScaledPassOutOfRange {
        kind: ExamKind,
        pass: u32,
        floor: u32,
        ceiling: u32,
    },
}

//
// ─── EXAM KIND ─────────────────────────────────────────────────────────────────
//

/// The exam types offered by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamKind {
    Reading,
    Listening,
    Knm,
    Writing,
    Speaking,
}

impl ExamKind {
    pub const ALL: [ExamKind; 5] = [
        ExamKind::Reading,
        ExamKind::Writing,
        ExamKind::Listening,
        ExamKind::Speaking,
        ExamKind::Knm,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamKind::Reading => "reading",
            ExamKind::Listening => "listening",
            ExamKind::Knm => "knm",
            ExamKind::Writing => "writing",
            ExamKind::Speaking => "speaking",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ExamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── POLICIES ──────────────────────────────────────────────────────────────────
//

/// How a finished session is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PassRule {
    /// Pass iff at least this many choice questions were answered correctly.
    CorrectCount { threshold: u32 },
    /// Pass iff the raw score reaches this many points.
    MinScore { points: u32 },
    /// Pass iff `round(floor + accuracy * range)` reaches `pass_scaled_points`.
    Scaled {
        floor_points: u32,
        points_range: u32,
        pass_scaled_points: u32,
    },
}

/// What happens to the question on screen when the countdown reaches zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Score the current question against whatever was recorded, then finalize.
    #[default]
    SubmitPending,
    /// Finalize without scoring the current question; the verdict is always fail.
    Forfeit,
}

/// Extra credit for a free-text answer that contains any of `phrases`.
///
/// A bonus scoped to a `task` only applies to questions of that writing task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseBonus {
    pub phrases: Vec<String>,
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<WritingTask>,
}

impl PhraseBonus {
    #[must_use]
    pub fn new(phrases: &[&str], points: u32) -> Self {
        Self {
            phrases: phrases.iter().map(|p| (*p).to_owned()).collect(),
            points,
            task: None,
        }
    }

    #[must_use]
    pub fn for_task(mut self, task: WritingTask) -> Self {
        self.task = Some(task);
        self
    }
}

/// Extra credit for a free-text answer of at least `min_sentences` sentences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceBonus {
    pub min_sentences: u32,
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<WritingTask>,
}

impl SentenceBonus {
    #[must_use]
    pub fn new(min_sentences: u32, points: u32) -> Self {
        Self {
            min_sentences,
            points,
            task: None,
        }
    }

    #[must_use]
    pub fn for_task(mut self, task: WritingTask) -> Self {
        self.task = Some(task);
        self
    }
}

/// Heuristic partial-credit rules for free-text and spoken answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeFormPolicy {
    /// Share of a question's points granted for a substantive attempt.
    pub attempt_credit_percent: u32,
    /// Text longer than this many characters counts as substantive.
    pub min_chars: usize,
    pub bonuses: Vec<PhraseBonus>,
    pub sentence_bonuses: Vec<SentenceBonus>,
}

impl Default for FreeFormPolicy {
    fn default() -> Self {
        Self {
            attempt_credit_percent: 80,
            min_chars: 20,
            bonuses: Vec::new(),
            sentence_bonuses: Vec::new(),
        }
    }
}

impl FreeFormPolicy {
    /// Policy used for the writing tasks.
    ///
    /// Salutation and closing formula earn a point on any task. An e-mail that
    /// asks a question earns two more, a text of three or more sentences one.
    #[must_use]
    pub fn writing() -> Self {
        Self {
            bonuses: vec![
                PhraseBonus::new(&["geachte", "beste"], 1),
                PhraseBonus::new(&["met vriendelijke groet", "groeten"], 1),
                PhraseBonus::new(&["vraag"], 2).for_task(WritingTask::Email),
            ],
            sentence_bonuses: vec![SentenceBonus::new(3, 1).for_task(WritingTask::Text)],
            ..Self::default()
        }
    }
}

/// Which percentage a rating table is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingBasis {
    /// `correct_count / total_questions`
    #[default]
    Accuracy,
    /// `score / sum of base points`
    Points,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingTier {
    pub min_percentage: u32,
    pub label: String,
    pub stars: u8,
}

impl RatingTier {
    #[must_use]
    pub fn new(min_percentage: u32, label: &str, stars: u8) -> Self {
        Self {
            min_percentage,
            label: label.to_owned(),
            stars,
        }
    }
}

/// Ordered feedback tiers, highest first; the last tier starts at 0%.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingTable {
    #[serde(default)]
    pub basis: RatingBasis,
    pub tiers: Vec<RatingTier>,
}

impl RatingTable {
    #[must_use]
    pub fn new(basis: RatingBasis, thresholds: [u32; 3], labels: [&str; 4]) -> Self {
        Self {
            basis,
            tiers: vec![
                RatingTier::new(thresholds[0], labels[0], 3),
                RatingTier::new(thresholds[1], labels[1], 2),
                RatingTier::new(thresholds[2], labels[2], 1),
                RatingTier::new(0, labels[3], 0),
            ],
        }
    }
}

impl Default for RatingTable {
    fn default() -> Self {
        Self::new(
            RatingBasis::Accuracy,
            [80, 60, 40],
            ["Uitstekend!", "Goed!", "Redelijk!", "Blijf oefenen!"],
        )
    }
}

/// A "chance of passing the real exam" band keyed on correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessBand {
    pub min_correct: u32,
    pub probability_percent: u8,
}

#[must_use]
pub fn default_readiness() -> Vec<ReadinessBand> {
    [(23, 95), (18, 65), (13, 35), (0, 15)]
        .into_iter()
        .map(|(min_correct, probability_percent)| ReadinessBand {
            min_correct,
            probability_percent,
        })
        .collect()
}

//
// ─── EXAM CONFIG ───────────────────────────────────────────────────────────────
//

/// Static description of one exam type (or one mock-exam section).
///
/// The session engine has no per-kind behaviour; everything that differs
/// between reading, listening, KNM, writing and speaking lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamConfig {
    pub kind: ExamKind,
    #[serde(default)]
    pub title: String,
    pub bank_id: BankId,
    pub total_seconds: u32,
    #[serde(default = "default_lives")]
    pub starting_lives: u32,
    #[serde(default)]
    pub question_count: Option<usize>,
    #[serde(default)]
    pub streak_bonus_per_correct: u32,
    pub pass_rule: PassRule,
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,
    #[serde(default)]
    pub free_form: FreeFormPolicy,
    #[serde(default)]
    pub rating: RatingTable,
    #[serde(default)]
    pub readiness: Vec<ReadinessBand>,
}

fn default_lives() -> u32 {
    3
}

impl ExamConfig {
    /// Minimal config: 3 lives, no streak bonus, default policies.
    #[must_use]
    pub fn new(kind: ExamKind, bank_id: BankId, total_seconds: u32, pass_rule: PassRule) -> Self {
        Self {
            kind,
            title: String::new(),
            bank_id,
            total_seconds,
            starting_lives: default_lives(),
            question_count: None,
            streak_bonus_per_correct: 0,
            pass_rule,
            timeout_policy: TimeoutPolicy::default(),
            free_form: FreeFormPolicy::default(),
            rating: RatingTable::default(),
            readiness: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_lives(mut self, lives: u32) -> Self {
        self.starting_lives = lives;
        self
    }

    #[must_use]
    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_streak_bonus(mut self, bonus: u32) -> Self {
        self.streak_bonus_per_correct = bonus;
        self
    }

    #[must_use]
    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    #[must_use]
    pub fn with_free_form(mut self, policy: FreeFormPolicy) -> Self {
        self.free_form = policy;
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: RatingTable) -> Self {
        self.rating = rating;
        self
    }

    #[must_use]
    pub fn with_readiness(mut self, bands: Vec<ReadinessBand>) -> Self {
        self.readiness = bands;
        self
    }

    /// Checks the record for values the session engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ExamConfigError` describing the first offending field.
    pub fn validate(&self) -> Result<(), ExamConfigError> {
        let kind = self.kind;
        if self.total_seconds == 0 {
            return Err(ExamConfigError::InvalidTotalSeconds { kind });
        }
        if self.starting_lives == 0 {
            return Err(ExamConfigError::InvalidStartingLives { kind });
        }
        if self.question_count == Some(0) {
            return Err(ExamConfigError::InvalidQuestionCount { kind });
        }
        if self.free_form.attempt_credit_percent > 100 {
            return Err(ExamConfigError::InvalidAttemptCredit { kind });
        }
        match self.rating.tiers.last() {
            None => return Err(ExamConfigError::EmptyRatingTable { kind }),
            Some(tier) if tier.min_percentage != 0 => {
                return Err(ExamConfigError::RatingTableHasNoFloor { kind });
            }
            Some(_) => {}
        }
        if let PassRule::Scaled {
            floor_points,
            points_range,
            pass_scaled_points,
        } = self.pass_rule
        {
            let ceiling = floor_points.saturating_add(points_range);
            if !(floor_points..=ceiling).contains(&pass_scaled_points) {
                return Err(ExamConfigError::ScaledPassOutOfRange {
                    kind,
                    pass: pass_scaled_points,
                    floor: floor_points,
                    ceiling,
                });
            }
        }
        Ok(())
    }
}

//
// ─── EXAM TABLE ────────────────────────────────────────────────────────────────
//

/// Scaled rule used by the mock exam: 200..=800, pass at 560 (60% correct).
pub const MOCK_SCALED_RULE: PassRule = PassRule::Scaled {
    floor_points: 200,
    points_range: 600,
    pass_scaled_points: 560,
};

/// Every exam record the application knows, plus the ordered mock-exam sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamTable {
    #[serde(default)]
    pub exams: BTreeMap<ExamKind, ExamConfig>,
    #[serde(default)]
    pub mock_exam: Vec<ExamConfig>,
}

impl ExamTable {
    #[must_use]
    pub fn get(&self, kind: ExamKind) -> Option<&ExamConfig> {
        self.exams.get(&kind)
    }

    /// Replaces entries of `self` with those present in `overrides`.
    ///
    /// A non-empty override mock exam replaces the whole section list.
    #[must_use]
    pub fn merged_with(mut self, overrides: ExamTable) -> Self {
        self.exams.extend(overrides.exams);
        if !overrides.mock_exam.is_empty() {
            self.mock_exam = overrides.mock_exam;
        }
        self
    }

    /// Validates every record in the table.
    ///
    /// # Errors
    ///
    /// Returns the first `ExamConfigError` found.
    pub fn validate(&self) -> Result<(), ExamConfigError> {
        self.exams
            .values()
            .chain(self.mock_exam.iter())
            .try_for_each(ExamConfig::validate)
    }
}

impl Default for ExamTable {
    fn default() -> Self {
        let knm_rating = RatingTable::new(
            RatingBasis::Points,
            [90, 70, 50],
            ["Uitstekend!", "Goed!", "Niet slecht!", "Blijf oefenen!"],
        );
        let reading_rating = RatingTable::new(
            RatingBasis::Points,
            [90, 70, 50],
            ["Excellent!", "Good!", "Not bad!", "Keep practicing!"],
        );
        let free_form_rating = RatingTable {
            basis: RatingBasis::Points,
            ..RatingTable::default()
        };
        let correct_18 = PassRule::CorrectCount { threshold: 18 };
        let points_18 = PassRule::MinScore { points: 18 };

        let reading = ExamConfig::new(ExamKind::Reading, BankId::new("reading"), 65 * 60, correct_18)
            .with_title("Lezen")
            .with_question_count(30)
            .with_streak_bonus(10)
            .with_rating(reading_rating)
            .with_readiness(default_readiness());
        let listening =
            ExamConfig::new(ExamKind::Listening, BankId::new("listening"), 30 * 60, correct_18)
                .with_title("Luisteren")
                .with_question_count(30)
                .with_streak_bonus(5)
                .with_readiness(default_readiness());
        let knm = ExamConfig::new(ExamKind::Knm, BankId::new("knm"), 45 * 60, correct_18)
            .with_title("Kennis van de Nederlandse Maatschappij")
            .with_question_count(30)
            .with_streak_bonus(5)
            .with_rating(knm_rating)
            .with_readiness(default_readiness());
        let writing = ExamConfig::new(ExamKind::Writing, BankId::new("writing"), 90 * 60, points_18)
            .with_title("Schrijven")
            .with_question_count(3)
            .with_free_form(FreeFormPolicy::writing())
            .with_rating(free_form_rating.clone());
        let speaking =
            ExamConfig::new(ExamKind::Speaking, BankId::new("speaking"), 15 * 60, points_18)
                .with_title("Spreken")
                .with_question_count(3)
                .with_rating(free_form_rating);

        let exams: BTreeMap<ExamKind, ExamConfig> = [reading, listening, knm, writing, speaking]
            .into_iter()
            .map(|config| (config.kind, config))
            .collect();

        let mock_exam = ExamKind::ALL
            .into_iter()
            .filter_map(|kind| exams.get(&kind).cloned())
            .map(|mut section| {
                if matches!(section.pass_rule, PassRule::CorrectCount { .. }) {
                    section.pass_rule = MOCK_SCALED_RULE;
                }
                section
            })
            .collect();

        Self { exams, mock_exam }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
