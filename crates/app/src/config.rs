//! Exam table and bank directory from the environment.
//!
//! `EXAM_CONFIG_PATH` may name a TOML file whose `[exams.<kind>]` tables and
//! `[[mock_exam]]` list override the built-in exam table. A file that cannot
//! be read, parsed or validated is logged and ignored.
//! `EXAM_BANK_DIR` names the directory of `<bank_id>.toml` files.

use std::path::PathBuf;

use exam_core::model::ExamTable;
use tracing::{error, info};

const DEFAULT_BANK_DIR: &str = "banks";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bank_dir: PathBuf,
    pub exams: ExamTable,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let bank_dir = std::env::var("EXAM_BANK_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_BANK_DIR), PathBuf::from);
        Self {
            bank_dir,
            exams: load_exam_table_from_env(),
        }
    }
}

/// Built-in table, overlaid with `EXAM_CONFIG_PATH` when it is set and valid.
#[must_use]
pub fn load_exam_table_from_env() -> ExamTable {
    let Ok(path) = std::env::var("EXAM_CONFIG_PATH") else {
        return ExamTable::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(raw) => match overlay_exam_table(&raw) {
            Ok(table) => {
                info!(target: "exam_app", %path, "Loaded exam config (TOML)");
                table
            }
            Err(e) => {
                error!(target: "exam_app", %path, error = %e, "Ignoring exam config");
                ExamTable::default()
            }
        },
        Err(e) => {
            error!(target: "exam_app", %path, error = %e, "Failed to read exam config file");
            ExamTable::default()
        }
    }
}

/// Parse `raw` as an exam table overlay and merge it onto the defaults.
///
/// # Errors
///
/// Returns a message for malformed TOML or for a merged table that fails
/// validation.
pub fn overlay_exam_table(raw: &str) -> Result<ExamTable, String> {
    let overrides: ExamTable = toml::from_str(raw).map_err(|e| e.to_string())?;
    let merged = ExamTable::default().merged_with(overrides);
    merged.validate().map_err(|e| e.to_string())?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{ExamKind, PassRule};

    #[test]
    fn overlay_replaces_only_named_exams() {
        let raw = r#"
            [exams.knm]
            kind = "knm"
            title = "KNM kort"
            bank_id = "knm-kort"
            total_seconds = 600
            question_count = 10
            pass_rule = { type = "correct_count", threshold = 6 }
        "#;
        let table = overlay_exam_table(raw).unwrap();

        let knm = table.get(ExamKind::Knm).unwrap();
        assert_eq!(knm.total_seconds, 600);
        assert_eq!(knm.starting_lives, 3);
        assert_eq!(knm.pass_rule, PassRule::CorrectCount { threshold: 6 });
        assert_eq!(knm.bank_id.as_str(), "knm-kort");

        let reading = table.get(ExamKind::Reading).unwrap();
        assert_eq!(reading.total_seconds, 65 * 60);
        assert_eq!(table.mock_exam.len(), 5);
    }

    #[test]
    fn invalid_overlay_is_rejected() {
        let raw = r#"
            [exams.reading]
            kind = "reading"
            bank_id = "reading"
            total_seconds = 0
            pass_rule = { type = "min_score", points = 18 }
        "#;
        assert!(overlay_exam_table(raw).is_err());
        assert!(overlay_exam_table("exams = 3").is_err());
    }
}
