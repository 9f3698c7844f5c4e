//! Question banks stored as TOML files, one file per bank.
//!
//! `<dir>/<bank_id>.toml` holds an array of `[[question]]` tables in the
//! `QuestionRecord` shape, in exam order.

use async_trait::async_trait;
use exam_core::model::{BankId, Question};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::repository::{QuestionRecord, QuestionSource, SourceError};

/// On-disk layout of a bank file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankFile {
    #[serde(default, rename = "question")]
    pub questions: Vec<QuestionRecord>,
}

impl BankFile {
    /// Parse a bank file.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Serialization` for malformed TOML.
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        toml::from_str(raw).map_err(|e| SourceError::Serialization(e.to_string()))
    }

    /// Render the bank back to TOML.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Serialization` if the records cannot be encoded.
    pub fn render(&self) -> Result<String, SourceError> {
        toml::to_string_pretty(self).map_err(|e| SourceError::Serialization(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `SourceError::InvalidRecord` for the first record that cannot
    /// become a domain question.
    pub fn into_questions(self) -> Result<Vec<Question>, SourceError> {
        self.questions
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect()
    }
}

/// Reads banks from a directory of TOML files.
#[derive(Debug, Clone)]
pub struct TomlQuestionSource {
    dir: PathBuf,
}

impl TomlQuestionSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, bank_id: &BankId) -> PathBuf {
        self.dir.join(format!("{}.toml", bank_id.as_str()))
    }
}

#[async_trait]
impl QuestionSource for TomlQuestionSource {
    async fn load(&self, bank_id: &BankId) -> Result<Vec<Question>, SourceError> {
        let path = self.path_for(bank_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                error!(target: "question_source", path = %path.display(), %bank_id, "Bank file not found");
                return Err(SourceError::NotFound(bank_id.clone()));
            }
            Err(e) => {
                error!(target: "question_source", path = %path.display(), error = %e, "Failed to read bank file");
                return Err(SourceError::Unavailable(e.to_string()));
            }
        };

        let questions = BankFile::parse(&raw)?.into_questions()?;
        info!(target: "question_source", path = %path.display(), %bank_id, count = questions.len(), "Loaded bank (TOML)");
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[question]]
id = 1
type = "multiple_choice"
prompt = "Wat is de hoofdstad van Nederland?"
options = ["Den Haag", "Rotterdam", "Utrecht", "Amsterdam"]
correct = 3
category = "Geografie"

[[question]]
id = 2
type = "free_text"
prompt = "Schrijf een e-mail aan het bureau voor rijexamens."
points = 10
min_words = 30
"#;

    #[test]
    fn parses_records_in_order() {
        let file = BankFile::parse(SAMPLE).unwrap();
        assert_eq!(file.questions.len(), 2);
        let questions = file.into_questions().unwrap();
        assert_eq!(questions[0].correct_index(), Some(3));
        assert_eq!(questions[0].points(), exam_core::model::DEFAULT_POINTS);
        assert_eq!(questions[1].min_words(), Some(30));
    }

    #[test]
    fn rendered_file_parses_back() {
        let file = BankFile::parse(SAMPLE).unwrap();
        let rendered = file.render().unwrap();
        assert_eq!(BankFile::parse(&rendered).unwrap(), file);
    }

    #[test]
    fn malformed_toml_is_a_serialization_error() {
        let err = BankFile::parse("[[question]]\nid = \"one\"").unwrap_err();
        assert!(matches!(err, SourceError::Serialization(_)));
    }

    #[test]
    fn bank_path_is_derived_from_id() {
        let source = TomlQuestionSource::new("/banks");
        assert_eq!(source.path_for(&BankId::new("knm")), PathBuf::from("/banks/knm.toml"));
    }
}
