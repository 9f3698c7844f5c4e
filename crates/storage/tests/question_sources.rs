use exam_core::model::{BankId, Question, QuestionBank, QuestionId};
use storage::{BankFile, InMemoryQuestionSource, QuestionRecord, QuestionSource, SourceError, TomlQuestionSource};

fn temp_bank_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("exam-banks-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn knm_questions() -> Vec<Question> {
    vec![
        Question::multiple_choice(
            QuestionId::new(1),
            "Hoeveel provincies heeft Nederland?",
            vec!["10".into(), "11".into(), "12".into(), "13".into()],
            2,
        )
        .with_category("Geografie"),
        Question::multiple_choice(
            QuestionId::new(2),
            "Welke eeuw wordt de Gouden Eeuw genoemd?",
            vec!["16e eeuw".into(), "17e eeuw".into()],
            1,
        )
        .with_category("Geschiedenis"),
    ]
}

#[tokio::test]
async fn in_memory_source_serves_inserted_banks() {
    let source = InMemoryQuestionSource::new();
    source.insert_bank(BankId::new("knm"), knm_questions()).unwrap();

    let loaded = source.load(&BankId::new("knm")).await.unwrap();
    assert_eq!(loaded, knm_questions());

    let missing = source.load(&BankId::new("reading")).await.unwrap_err();
    assert!(matches!(missing, SourceError::NotFound(_)));
}

#[tokio::test]
async fn toml_source_round_trips_a_written_bank() {
    let dir = temp_bank_dir();
    let file = BankFile {
        questions: knm_questions().iter().map(QuestionRecord::from_question).collect(),
    };
    std::fs::write(dir.join("knm.toml"), file.render().unwrap()).unwrap();

    let source = TomlQuestionSource::new(&dir);
    let loaded = source.load(&BankId::new("knm")).await.unwrap();
    let bank = QuestionBank::new(loaded).unwrap();

    assert_eq!(bank.len(), 2);
    assert_eq!(bank.get(1).unwrap().category(), "Geschiedenis");

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn toml_source_reports_missing_bank() {
    let dir = temp_bank_dir();
    let source = TomlQuestionSource::new(&dir);

    let err = source.load(&BankId::new("listening")).await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound(id) if id.as_str() == "listening"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn empty_bank_file_loads_as_empty_and_is_rejected_by_bank() {
    let dir = temp_bank_dir();
    std::fs::write(dir.join("writing.toml"), "").unwrap();

    let source = TomlQuestionSource::new(&dir);
    let loaded = source.load(&BankId::new("writing")).await.unwrap();
    assert!(loaded.is_empty());
    assert!(QuestionBank::new(loaded).is_err());

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn shipped_banks_load_as_valid_banks() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../banks");
    let source = TomlQuestionSource::new(dir);
    for bank in ["reading", "listening", "knm", "writing", "speaking"] {
        let questions = source.load(&BankId::new(bank)).await.unwrap();
        let bank = QuestionBank::new(questions).unwrap();
        assert!(!bank.is_empty());
    }
}
