mod config;
mod player;
mod telemetry;
mod view;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use exam_core::model::{ExamKind, SessionSnapshot, SessionStatus};
use services::{
    Clock, PlaybackLog, SessionDriver, SessionLoopService, SessionObserver, TracingObserver,
};
use storage::TomlQuestionSource;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use config::AppConfig;
use player::{SectionEnd, finish_section, play_section};
use view::render_outcome;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownExam { raw: String },
    InvalidSeed { raw: String },
    MissingExam,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownExam { raw } => write!(f, "unknown exam: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::MissingExam => write!(f, "run requires an exam name"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  exam-app list");
    eprintln!("  exam-app run <exam> [--bank-dir <dir>] [--shuffle] [--seed <n>] [--json]");
    eprintln!("  exam-app mock       [--bank-dir <dir>] [--shuffle] [--seed <n>] [--json]");
    eprintln!();
    eprintln!("Exams: reading, listening, knm, writing, speaking");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_BANK_DIR     directory of <bank_id>.toml files (default: banks)");
    eprintln!("  EXAM_CONFIG_PATH  TOML overlay for the exam table");
    eprintln!("  LOG_LEVEL, LOG_FORMAT=json");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Run(ExamKind),
    Mock,
}

#[derive(Debug)]
struct Args {
    command: Command,
    bank_dir: Option<PathBuf>,
    shuffle: bool,
    seed: Option<u64>,
    json: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let command = match args.next().as_deref() {
            None | Some("--help" | "-h" | "help") => return Ok(None),
            Some("list") => Command::List,
            Some("mock") => Command::Mock,
            Some("run") => {
                let raw = args.next().ok_or(ArgsError::MissingExam)?;
                let kind =
                    ExamKind::from_name(&raw).ok_or(ArgsError::UnknownExam { raw })?;
                Command::Run(kind)
            }
            Some(other) => return Err(ArgsError::UnknownArg(other.to_owned())),
        };

        let mut parsed = Self {
            command,
            bank_dir: None,
            shuffle: false,
            seed: None,
            json: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank-dir" => parsed.bank_dir = Some(require_value(&mut args, "--bank-dir")?.into()),
                "--shuffle" => parsed.shuffle = true,
                "--seed" => {
                    let value = require_value(&mut args, "--seed")?;
                    let seed = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    parsed.seed = Some(seed);
                }
                "--json" => parsed.json = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Some(parsed))
    }
}

fn timeout_notice() -> Arc<dyn SessionObserver> {
    Arc::new(|snapshot: &SessionSnapshot| {
        if snapshot.status.is_terminal() && snapshot.remaining_seconds == 0 {
            println!("\nTime is up! Press Enter to see your result.");
        }
    })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    let mut config = AppConfig::from_env();
    if let Some(dir) = args.bank_dir.clone() {
        config.bank_dir = dir;
    }

    if args.command == Command::List {
        for kind in ExamKind::ALL {
            if let Some(exam) = config.exams.get(kind) {
                println!(
                    "{:<10} {:<40} {:>3} min  bank {}",
                    kind.as_str(),
                    exam.title,
                    exam.total_seconds / 60,
                    exam.bank_id
                );
            }
        }
        return Ok(());
    }

    info!(target: "exam_app", bank_dir = %config.bank_dir.display(), "Using question banks");
    let playback = PlaybackLog::new();
    let mut loop_svc = SessionLoopService::new(
        Clock::default(),
        Arc::new(TomlQuestionSource::new(config.bank_dir.clone())),
        config.exams.clone(),
    )
    .with_shuffle(args.shuffle)
    .with_audio_gate(Arc::new(playback.clone()))
    .with_observer(Arc::new(TracingObserver))
    .with_observer(timeout_notice());
    if let Some(seed) = args.seed {
        loop_svc = loop_svc.with_shuffle_seed(seed);
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match args.command {
        Command::Run(kind) => {
            let mut driver = SessionDriver::new(loop_svc.create_session(kind).await?);
            let title = driver.with_session(|s| s.config().title.clone())?;
            println!("{title}");
            if play_section(&mut driver, &playback, &mut input).await? == SectionEnd::InputClosed {
                println!("\nInput closed, attempt abandoned.");
                return Ok(());
            }
            if let Some(outcome) = finish_section(&driver)? {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                } else {
                    println!("{}", render_outcome(&title, &outcome));
                }
            }
        }
        Command::Mock => {
            let mut exam = loop_svc.create_mock_exam().await?;
            loop {
                let title = exam
                    .current()
                    .with_session(|s| s.config().title.clone())?;
                println!(
                    "\n### Section {} of {}: {title}",
                    exam.current_index() + 1,
                    exam.section_count()
                );
                let end = play_section(exam.current_mut(), &playback, &mut input).await?;
                if end == SectionEnd::InputClosed {
                    println!("\nInput closed, mock exam abandoned.");
                    return Ok(());
                }
                if let Some(outcome) = finish_section(exam.current())? {
                    if !args.json {
                        println!("{}", render_outcome(&title, &outcome));
                    }
                }
                if !exam.next_section()? {
                    break;
                }
            }

            let report = exam.report()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "\nMock exam: {} of {} sections passed, overall {}",
                    report.passed_sections(),
                    report.sections.len(),
                    if report.passed() { "PASS" } else { "FAIL" }
                );
            }
        }
        Command::List => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn run_takes_exam_and_flags() {
        let args = parse(&["run", "KNM", "--seed", "42", "--json", "--bank-dir", "/tmp/b"])
            .unwrap()
            .unwrap();
        assert_eq!(args.command, Command::Run(ExamKind::Knm));
        assert_eq!(args.seed, Some(42));
        assert!(args.json);
        assert_eq!(args.bank_dir, Some(PathBuf::from("/tmp/b")));
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(matches!(parse(&["run"]), Err(ArgsError::MissingExam)));
        assert!(matches!(parse(&["run", "math"]), Err(ArgsError::UnknownExam { .. })));
        assert!(matches!(parse(&["mock", "--seed"]), Err(ArgsError::MissingValue { flag: "--seed" })));
        assert!(matches!(parse(&["mock", "--seed", "x"]), Err(ArgsError::InvalidSeed { .. })));
        assert!(matches!(parse(&["mock", "--loud"]), Err(ArgsError::UnknownArg(_))));
        assert!(parse(&[]).unwrap().is_none());
    }
}
