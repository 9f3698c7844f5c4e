use std::sync::Arc;

use exam_core::model::{
    BankId, ExamKind, ExamTable, Question, QuestionId, Response, SessionStatus,
};
use exam_core::time::fixed_clock;
use services::{ManualClock, SessionError, SessionLoopService};
use storage::repository::InMemoryQuestionSource;

fn seeded_source(table: &ExamTable) -> Arc<InMemoryQuestionSource> {
    let source = InMemoryQuestionSource::new();
    for config in table.exams.values() {
        let questions: Vec<Question> = (1..=30)
            .map(|id| match config.kind {
                ExamKind::Writing => Question::free_text(QuestionId::new(id), "Schrijf een brief."),
                ExamKind::Speaking => {
                    Question::spoken_response(QuestionId::new(id), "Beschrijf je huis.")
                }
                _ => Question::multiple_choice(
                    QuestionId::new(id),
                    format!("Vraag {id}"),
                    vec!["goed".into(), "fout".into()],
                    0,
                ),
            })
            .collect();
        source
            .insert_bank(BankId::new(config.bank_id.as_str()), questions)
            .unwrap();
    }
    Arc::new(source)
}

#[tokio::test]
async fn mock_exam_runs_every_section_in_order() {
    let table = ExamTable::default();
    let loop_svc = SessionLoopService::new(fixed_clock(), seeded_source(&table), table);
    let mut exam = loop_svc.create_mock_exam().await.unwrap();
    assert_eq!(exam.section_count(), 5);

    loop {
        let driver = exam.current_mut();
        let (_ticker, clock) = ManualClock::channel();
        driver.start_with_clock(Box::new(clock)).unwrap();

        let mut status = SessionStatus::InProgress;
        while status == SessionStatus::InProgress {
            let response = match driver.with_session(|s| s.config().kind).unwrap() {
                ExamKind::Writing => Response::text(vec!["zin"; 40].join(" ")),
                ExamKind::Speaking => Response::recording("opname.wav", 30),
                _ => Response::choice(0),
            };
            driver.record_answer(response).unwrap();
            status = driver.advance().unwrap();
        }
        assert_eq!(status, SessionStatus::Completed);

        if !exam.next_section().unwrap() {
            break;
        }
    }

    assert!(exam.is_finished().unwrap());
    let report = exam.report().unwrap();
    let kinds: Vec<ExamKind> = report.sections.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, ExamKind::ALL.to_vec());

    let reading = report.sections[0].outcome.as_ref().unwrap();
    assert_eq!(reading.scaled_points, Some(800));
    let writing = report.sections[1].outcome.as_ref().unwrap();
    assert_eq!(writing.score, 24);
    assert!(report.passed());
    assert_eq!(report.passed_sections(), 5);
}

#[tokio::test]
async fn next_section_waits_for_the_current_one() {
    let table = ExamTable::default();
    let loop_svc = SessionLoopService::new(fixed_clock(), seeded_source(&table), table);
    let mut exam = loop_svc.create_mock_exam().await.unwrap();

    assert!(matches!(
        exam.next_section(),
        Err(SessionError::SectionUnfinished { index: 0, status: SessionStatus::NotStarted })
    ));

    let (_ticker, clock) = ManualClock::channel();
    exam.current_mut().start_with_clock(Box::new(clock)).unwrap();
    assert!(exam.next_section().is_err());
    assert!(!exam.is_finished().unwrap());

    exam.reset().unwrap();
    assert_eq!(exam.current_index(), 0);
    assert!(
        exam.statuses()
            .unwrap()
            .iter()
            .all(|status| *status == SessionStatus::NotStarted)
    );
    assert!(!exam.report().unwrap().passed());
}

#[tokio::test]
async fn empty_mock_exam_is_rejected() {
    let table = ExamTable {
        mock_exam: Vec::new(),
        ..ExamTable::default()
    };
    let loop_svc = SessionLoopService::new(fixed_clock(), seeded_source(&table), table);
    assert!(matches!(
        loop_svc.create_mock_exam().await,
        Err(SessionError::EmptyMockExam)
    ));
}
