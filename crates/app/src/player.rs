//! Interactive play loop over stdin/stdout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{info, warn};

use exam_core::model::{Response, ResponseKind, SessionOutcome};
use exam_core::scoring::word_count;
use services::{PlaybackLog, SessionDriver, SessionError};

use crate::view::QuestionView;

/// Why a section stopped being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionEnd {
    Finished,
    InputClosed,
}

/// Turn one line of input into a response for the question on screen.
///
/// `Ok(None)` means "no answer" (skip); `Err` carries a message to show.
pub fn parse_response(view: &QuestionView, line: &str) -> Result<Option<Response>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    match view.expects {
        ResponseKind::Choice => {
            let n: usize = line
                .parse()
                .map_err(|_| format!("type a number between 1 and {}", view.options.len()))?;
            if n == 0 || n > view.options.len() {
                return Err(format!("type a number between 1 and {}", view.options.len()));
            }
            Ok(Some(Response::choice(n - 1)))
        }
        ResponseKind::Text => Ok(Some(Response::text(line))),
        ResponseKind::Recording => Ok(Some(Response::recording(
            format!("terminal:{}", view.id),
            word_count(line),
        ))),
    }
}

/// Start the driven session and play it until it is terminal or input ends.
///
/// The countdown keeps running while the player is typing; a timeout that
/// happens in between is reported on the next line read.
///
/// # Errors
///
/// Returns `SessionError` for anything other than a command racing the timeout.
pub async fn play_section<R>(
    driver: &mut SessionDriver,
    playback: &PlaybackLog,
    input: &mut Lines<R>,
) -> Result<SectionEnd, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    driver.start()?;

    while let Some(view) = driver.with_session(QuestionView::capture)? {
        println!("{}", view.render());

        if !view.answerable {
            println!("Press Enter once the audio has finished playing.");
            if next_line(input).await.is_none() {
                return Ok(SectionEnd::InputClosed);
            }
            playback.mark_finished(view.id);
            continue;
        }

        let Some(line) = next_line(input).await else {
            return Ok(SectionEnd::InputClosed);
        };
        let response = match parse_response(&view, &line) {
            Ok(response) => response,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        if let Some(response) = response {
            match driver.record_answer(response) {
                Ok(()) => {}
                Err(SessionError::InvalidTransition { .. }) => break,
                Err(err @ (SessionError::GateNotSatisfied { .. } | SessionError::ResponseMismatch { .. })) => {
                    println!("{err}");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }
        match driver.advance() {
            Ok(_) | Err(SessionError::InvalidTransition { .. }) => {}
            Err(err) => return Err(err),
        }
    }

    Ok(SectionEnd::Finished)
}

async fn next_line<R>(input: &mut Lines<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match input.next_line().await {
        Ok(line) => line,
        Err(err) => {
            warn!(target: "exam_app", error = %err, "Failed to read input");
            None
        }
    }
}

/// Log and return the outcome of a finished section.
///
/// # Errors
///
/// Returns `SessionError::Poisoned` if the session lock is poisoned.
pub fn finish_section(driver: &SessionDriver) -> Result<Option<SessionOutcome>, SessionError> {
    let outcome = driver.outcome()?;
    if let Some(outcome) = &outcome {
        info!(
            target: "exam_app",
            attempt_id = %outcome.attempt_id,
            status = %outcome.status,
            score = outcome.score,
            passed = outcome.passed(),
            "Section finished"
        );
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{BankId, ExamConfig, ExamKind, PassRule, Question, QuestionBank, QuestionId};
    use services::ExamSession;
    use std::sync::Arc;
    use tokio::io::BufReader;

    fn view(expects: ResponseKind) -> QuestionView {
        QuestionView {
            id: QuestionId::new(3),
            number: 1,
            total: 1,
            prompt: "?".into(),
            options: vec!["a".into(), "b".into(), "c".into()],
            expects,
            audio: None,
            answerable: true,
            remaining_seconds: 60,
            lives: 3,
            streak: 0,
            score: 0,
            reward: 10,
            min_words: None,
        }
    }

    #[test]
    fn choice_input_is_one_based() {
        let v = view(ResponseKind::Choice);
        assert_eq!(parse_response(&v, " 2 "), Ok(Some(Response::choice(1))));
        assert_eq!(parse_response(&v, ""), Ok(None));
        assert!(parse_response(&v, "0").is_err());
        assert!(parse_response(&v, "4").is_err());
        assert!(parse_response(&v, "b").is_err());
    }

    #[test]
    fn spoken_input_becomes_a_recording_with_word_count() {
        let v = view(ResponseKind::Recording);
        assert_eq!(
            parse_response(&v, "ik werk in een bakkerij"),
            Ok(Some(Response::recording("terminal:3", 5)))
        );
    }

    #[tokio::test]
    async fn scripted_input_plays_a_section_to_completion() {
        let bank = QuestionBank::new(
            (1..=3)
                .map(|id| {
                    Question::multiple_choice(
                        QuestionId::new(id),
                        format!("Vraag {id}"),
                        vec!["ja".into(), "nee".into()],
                        0,
                    )
                })
                .collect(),
        )
        .unwrap();
        let config = ExamConfig::new(
            ExamKind::Knm,
            BankId::new("knm"),
            600,
            PassRule::CorrectCount { threshold: 2 },
        );
        let mut driver = SessionDriver::new(ExamSession::new(Arc::new(bank), config).unwrap());
        let script: &[u8] = b"1\nx\n\n1\n";
        let mut input = BufReader::new(script).lines();

        let end = play_section(&mut driver, &PlaybackLog::new(), &mut input)
            .await
            .unwrap();

        assert_eq!(end, SectionEnd::Finished);
        let outcome = finish_section(&driver).unwrap().unwrap();
        assert_eq!(outcome.correct_count, 2);
        assert!(outcome.passed());
    }
}
