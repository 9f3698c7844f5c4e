#![forbid(unsafe_code)]

pub mod repository;
pub mod toml_source;

pub use repository::{InMemoryQuestionSource, QuestionRecord, QuestionSource, QuestionType, SourceError};
pub use toml_source::{BankFile, TomlQuestionSource};
