//! Pure scoring functions used by the session engine.
//!
//! Choice questions are right or wrong and feed the streak/lives mechanics.
//! Free-form questions (written text, spoken recordings) only ever earn
//! heuristic partial credit: a fixed share of their points for a substantive
//! attempt plus optional phrase and sentence bonuses, capped at the
//! question's points.

use crate::model::{
    FreeFormPolicy, PassRule, Question, Rating, RatingBasis, RatingTable, ReadinessBand, Response,
    WritingTask,
};

//
// ─── PER-QUESTION SCORE ────────────────────────────────────────────────────────
//

/// How a single question was judged when the session moved past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionScore {
    /// Choice answered correctly: extends the streak.
    Correct { reward: u32 },
    /// Choice answered wrongly or not at all: breaks the streak, costs a life.
    Incorrect,
    /// Free-form credit; never touches streak or lives.
    Credited { reward: u32 },
}

impl QuestionScore {
    #[must_use]
    pub fn reward(self) -> u32 {
        match self {
            QuestionScore::Correct { reward } | QuestionScore::Credited { reward } => reward,
            QuestionScore::Incorrect => 0,
        }
    }

    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, QuestionScore::Correct { .. })
    }
}

/// Reward for a correct choice answer given the streak *before* this answer.
#[must_use]
pub fn choice_reward(points: u32, streak: u32, streak_bonus_per_correct: u32) -> u32 {
    points.saturating_add(streak.saturating_mul(streak_bonus_per_correct))
}

/// Scores `question` against the recorded response (`None` when omitted).
#[must_use]
pub fn score_question(
    question: &Question,
    response: Option<&Response>,
    streak: u32,
    streak_bonus_per_correct: u32,
    policy: &FreeFormPolicy,
) -> QuestionScore {
    match question.correct_index() {
        Some(correct_index) => match response {
            Some(Response::Choice { index }) if *index == correct_index => QuestionScore::Correct {
                reward: choice_reward(question.points(), streak, streak_bonus_per_correct),
            },
            _ => QuestionScore::Incorrect,
        },
        None => QuestionScore::Credited {
            reward: response.map_or(0, |r| free_form_credit(question, r, policy)),
        },
    }
}

/// Number of whitespace-separated words in `text`.
#[must_use]
pub fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Partial credit for a free-text or spoken response.
///
/// Text is substantive when it is longer than `policy.min_chars` characters or
/// reaches the question's `min_words`. A recording is substantive when it has
/// a reference and reaches `min_words` (any recording counts when unset).
#[must_use]
pub fn free_form_credit(question: &Question, response: &Response, policy: &FreeFormPolicy) -> u32 {
    let points = question.points();
    let attempt_credit = points.saturating_mul(policy.attempt_credit_percent.min(100)) / 100;

    let earned = match response {
        Response::Text { text } => {
            let text = text.trim();
            if text.is_empty() {
                return 0;
            }
            let words = word_count(text);
            let substantive = text.chars().count() > policy.min_chars
                || question.min_words().is_some_and(|min| words >= min);
            let base = if substantive { attempt_credit } else { 0 };
            base.saturating_add(phrase_bonus(question, text, policy))
                .saturating_add(sentence_bonus(question, text, policy))
        }
        Response::Recording {
            reference,
            word_count,
        } => {
            let recorded = !reference.trim().is_empty();
            let long_enough = question.min_words().is_none_or(|min| *word_count >= min);
            if recorded && long_enough { attempt_credit } else { 0 }
        }
        Response::Choice { .. } => 0,
    };

    earned.min(points)
}

/// Sum of bonuses whose phrase list matches `text`, each group counted once.
fn phrase_bonus(question: &Question, text: &str, policy: &FreeFormPolicy) -> u32 {
    let lowered = text.to_lowercase();
    policy
        .bonuses
        .iter()
        .filter(|bonus| applies_to(bonus.task, question))
        .filter(|bonus| {
            bonus
                .phrases
                .iter()
                .any(|phrase| !phrase.is_empty() && lowered.contains(&phrase.to_lowercase()))
        })
        .fold(0_u32, |acc, bonus| acc.saturating_add(bonus.points))
}

fn sentence_bonus(question: &Question, text: &str, policy: &FreeFormPolicy) -> u32 {
    let sentences = sentence_count(text);
    policy
        .sentence_bonuses
        .iter()
        .filter(|bonus| applies_to(bonus.task, question) && sentences >= bonus.min_sentences)
        .fold(0_u32, |acc, bonus| acc.saturating_add(bonus.points))
}

fn applies_to(task: Option<WritingTask>, question: &Question) -> bool {
    task.is_none_or(|task| question.task() == Some(task))
}

/// Number of non-empty sentences in `text`, split on `.`, `!` and `?`.
#[must_use]
pub fn sentence_count(text: &str) -> u32 {
    let count = text
        .split(['.', '!', '?'])
        .filter(|sentence| !sentence.trim().is_empty())
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

//
// ─── AGGREGATES ────────────────────────────────────────────────────────────────
//

/// `part / whole * 100`, or 0 for an empty whole.
#[must_use]
pub fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(whole) * 100.0
}

/// `round(floor + accuracy * range)` where accuracy is `correct / total`.
#[must_use]
pub fn scaled_points(correct_count: u32, total_questions: u32, floor_points: u32, points_range: u32) -> u32 {
    let pct = percentage(correct_count, total_questions);
    let scaled = f64::from(floor_points) + pct / 100.0 * f64::from(points_range);
    // Bounded by floor + range, which fits in u32.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = scaled.round() as u32;
    rounded
}

/// Scaled points when the rule is scaled, `None` otherwise.
#[must_use]
pub fn scaled_for_rule(rule: &PassRule, correct_count: u32, total_questions: u32) -> Option<u32> {
    match *rule {
        PassRule::Scaled {
            floor_points,
            points_range,
            ..
        } => Some(scaled_points(
            correct_count,
            total_questions,
            floor_points,
            points_range,
        )),
        _ => None,
    }
}

/// Applies a pass rule to finalized totals.
#[must_use]
pub fn is_passed(rule: &PassRule, score: u32, correct_count: u32, total_questions: u32) -> bool {
    match *rule {
        PassRule::CorrectCount { threshold } => correct_count >= threshold,
        PassRule::MinScore { points } => score >= points,
        PassRule::Scaled {
            floor_points,
            points_range,
            pass_scaled_points,
        } => {
            scaled_points(correct_count, total_questions, floor_points, points_range)
                >= pass_scaled_points
        }
    }
}

/// Percentage a rating table is evaluated against.
#[must_use]
pub fn rating_percentage(
    basis: RatingBasis,
    score: u32,
    max_points: u32,
    correct_count: u32,
    total_questions: u32,
) -> f64 {
    match basis {
        RatingBasis::Accuracy => percentage(correct_count, total_questions),
        RatingBasis::Points => percentage(score, max_points),
    }
}

/// First tier (top-down) whose minimum the percentage reaches.
#[must_use]
pub fn rate(table: &RatingTable, percentage: f64) -> Rating {
    table
        .tiers
        .iter()
        .find(|tier| percentage >= f64::from(tier.min_percentage))
        .or_else(|| table.tiers.last())
        .map_or_else(
            || Rating {
                label: String::new(),
                stars: 0,
            },
            |tier| Rating {
                label: tier.label.clone(),
                stars: tier.stars,
            },
        )
}

/// First readiness band (top-down) the correct count reaches.
#[must_use]
pub fn readiness(bands: &[ReadinessBand], correct_count: u32) -> Option<ReadinessBand> {
    bands
        .iter()
        .find(|band| correct_count >= band.min_correct)
        .copied()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, default_readiness};

    fn choice(points: u32) -> Question {
        Question::multiple_choice(
            QuestionId::new(1),
            "Hoeveel provincies heeft Nederland?",
            vec!["10".into(), "11".into(), "12".into(), "13".into()],
            2,
        )
        .with_points(points)
    }

    fn words(n: usize) -> String {
        vec!["woord"; n].join(" ")
    }

    #[test]
    fn correct_choice_earns_points_plus_streak_bonus() {
        let q = choice(10);
        let policy = FreeFormPolicy::default();
        let rewards: Vec<u32> = (0..3)
            .map(|streak| score_question(&q, Some(&Response::choice(2)), streak, 5, &policy).reward())
            .collect();
        assert_eq!(rewards, vec![10, 15, 20]);
        assert_eq!(rewards.iter().sum::<u32>(), 45);
    }

    #[test]
    fn wrong_or_missing_choice_is_incorrect() {
        let q = choice(10);
        let policy = FreeFormPolicy::default();
        assert_eq!(
            score_question(&q, Some(&Response::choice(0)), 4, 5, &policy),
            QuestionScore::Incorrect
        );
        assert_eq!(score_question(&q, None, 4, 5, &policy), QuestionScore::Incorrect);
        assert_eq!(
            score_question(&q, Some(&Response::text("12")), 0, 5, &policy),
            QuestionScore::Incorrect
        );
    }

    #[test]
    fn sixty_words_against_min_fifty_earns_eighty_percent() {
        let q = Question::free_text(QuestionId::new(2), "Schrijf een e-mail")
            .with_min_words(50)
            .with_points(10);
        let score = score_question(&q, Some(&Response::text(words(60))), 3, 5, &FreeFormPolicy::default());
        assert_eq!(score, QuestionScore::Credited { reward: 8 });
    }

    #[test]
    fn short_text_without_min_words_gets_no_attempt_credit() {
        let q = Question::free_text(QuestionId::new(2), "Schrijf").with_points(10);
        let policy = FreeFormPolicy::default();
        assert_eq!(free_form_credit(&q, &Response::text("Hallo"), &policy), 0);
        assert_eq!(free_form_credit(&q, &Response::text("   "), &policy), 0);
    }

    #[test]
    fn phrase_bonuses_stack_once_per_group_and_cap_at_points() {
        let q = Question::free_text(QuestionId::new(3), "E-mail")
            .with_task(WritingTask::Email)
            .with_points(10);
        let policy = FreeFormPolicy::writing();

        let text = format!("Beste meneer, {} Ik heb een vraag. Met vriendelijke groet", words(40));
        assert_eq!(free_form_credit(&q, &Response::text(text), &policy), 10);

        let small = Question::free_text(QuestionId::new(4), "Formulier").with_points(8);
        let salutation_only = format!("Geachte heer, {}", words(40));
        // 80% of 8 = 6, +1 for the salutation.
        assert_eq!(free_form_credit(&small, &Response::text(salutation_only), &policy), 7);
    }

    #[test]
    fn asking_a_question_only_pays_off_in_an_email() {
        let policy = FreeFormPolicy::writing();
        let text = format!("{} Ik heb een vraag over de cursus", words(30));

        let email = Question::free_text(QuestionId::new(7), "Mail de school")
            .with_task(WritingTask::Email)
            .with_points(10);
        // 80% of 10 = 8, +2 for asking a question.
        assert_eq!(free_form_credit(&email, &Response::text(text.clone()), &policy), 10);

        let form = Question::free_text(QuestionId::new(8), "Formulier")
            .with_task(WritingTask::Form)
            .with_points(10);
        assert_eq!(free_form_credit(&form, &Response::text(text), &policy), 8);
    }

    #[test]
    fn three_sentences_earn_a_point_in_a_text_task() {
        let policy = FreeFormPolicy::writing();
        let text = format!("{}. Ik woon in Utrecht. Ik werk bij een bakker.", words(30));
        assert_eq!(sentence_count(&text), 3);

        let task = Question::free_text(QuestionId::new(9), "Over jezelf")
            .with_task(WritingTask::Text)
            .with_points(10);
        // 80% of 10 = 8, +1 for three sentences.
        assert_eq!(free_form_credit(&task, &Response::text(text.clone()), &policy), 9);

        let two = format!("{}. Ik woon in Utrecht.", words(30));
        assert_eq!(free_form_credit(&task, &Response::text(two), &policy), 8);

        let email = Question::free_text(QuestionId::new(10), "Mail")
            .with_task(WritingTask::Email)
            .with_points(10);
        assert_eq!(free_form_credit(&email, &Response::text(text), &policy), 8);
    }

    #[test]
    fn any_recording_counts_unless_below_min_words() {
        let q = Question::spoken_response(QuestionId::new(5), "Vertel").with_points(10);
        let policy = FreeFormPolicy::default();
        assert_eq!(free_form_credit(&q, &Response::recording("rec.webm", 0), &policy), 8);
        assert_eq!(free_form_credit(&q, &Response::recording(" ", 30), &policy), 0);

        let strict = q.with_min_words(10);
        assert_eq!(free_form_credit(&strict, &Response::recording("rec.webm", 9), &policy), 0);
        assert_eq!(free_form_credit(&strict, &Response::recording("rec.webm", 10), &policy), 8);
    }

    #[test]
    fn free_form_never_reports_correct_or_incorrect() {
        let q = Question::spoken_response(QuestionId::new(6), "Vertel");
        let score = score_question(&q, None, 2, 5, &FreeFormPolicy::default());
        assert_eq!(score, QuestionScore::Credited { reward: 0 });
        assert!(!score.is_correct());
    }

    #[test]
    fn scaled_points_follow_floor_and_range() {
        assert_eq!(scaled_points(0, 30, 200, 600), 200);
        assert_eq!(scaled_points(30, 30, 200, 600), 800);
        assert_eq!(scaled_points(18, 30, 200, 600), 560);
        assert_eq!(scaled_points(1, 3, 200, 600), 400);
        assert_eq!(scaled_points(5, 0, 200, 600), 200);
    }

    #[test]
    fn pass_rules() {
        let scaled = PassRule::Scaled {
            floor_points: 200,
            points_range: 600,
            pass_scaled_points: 560,
        };
        assert!(is_passed(&scaled, 0, 18, 30));
        assert!(!is_passed(&scaled, 0, 17, 30));
        assert!(is_passed(&PassRule::CorrectCount { threshold: 18 }, 0, 18, 30));
        assert!(!is_passed(&PassRule::MinScore { points: 18 }, 17, 30, 30));
        assert_eq!(scaled_for_rule(&scaled, 18, 30), Some(560));
        assert_eq!(scaled_for_rule(&PassRule::MinScore { points: 1 }, 18, 30), None);
    }

    #[test]
    fn rating_is_first_match_top_down() {
        let table = RatingTable::default();
        assert_eq!(rate(&table, 100.0).stars, 3);
        assert_eq!(rate(&table, 80.0).label, "Uitstekend!");
        assert_eq!(rate(&table, 79.9).stars, 2);
        assert_eq!(rate(&table, 40.0).stars, 1);
        assert_eq!(rate(&table, 0.0).label, "Blijf oefenen!");
    }

    #[test]
    fn rating_percentage_by_basis() {
        assert!((rating_percentage(RatingBasis::Accuracy, 0, 0, 24, 30) - 80.0).abs() < 1e-9);
        assert!((rating_percentage(RatingBasis::Points, 150, 300, 0, 30) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn readiness_bands() {
        let bands = default_readiness();
        assert_eq!(readiness(&bands, 25).map(|b| b.probability_percent), Some(95));
        assert_eq!(readiness(&bands, 18).map(|b| b.probability_percent), Some(65));
        assert_eq!(readiness(&bands, 0).map(|b| b.probability_percent), Some(15));
        assert_eq!(readiness(&[], 10), None);
    }
}
