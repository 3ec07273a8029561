use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use exam_core::model::{DEFAULT_MINUTES, DEFAULT_QUESTIONS};
use services::{BankService, Clock, ExamController, ExamError, ImportFormat, ImportOutcome};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod render;
mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingPath { command: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidFormat { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingPath { command } => write!(f, "{command} requires a file path"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidFormat { raw } => {
                write!(f, "invalid --format value (expected auto, json or text): {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn parse_number(raw: String, flag: &'static str) -> Result<u32, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Exam,
    Import,
    Export,
    Stats,
    Clear,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "exam" => Some(Self::Exam),
            "import" => Some(Self::Import),
            "export" => Some(Self::Export),
            "stats" => Some(Self::Stats),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportMode {
    Auto,
    Json,
    Text,
}

#[derive(Debug)]
struct Args {
    db_url: String,
    questions: u32,
    minutes: u32,
    path: Option<PathBuf>,
    mode: ImportMode,
}

impl Args {
    fn from_env() -> Self {
        let env_number = |name: &str, default: u32| {
            std::env::var(name)
                .ok()
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(default)
        };
        Self {
            db_url: std::env::var("EXAM_DB_URL")
                .ok()
                .map_or_else(|| normalize_sqlite_url("exam.sqlite3".into()), normalize_sqlite_url),
            questions: env_number("EXAM_QUESTIONS", DEFAULT_QUESTIONS),
            minutes: env_number("EXAM_MINUTES", DEFAULT_MINUTES),
            path: None,
            mode: ImportMode::Auto,
        }
    }

    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--questions" | "-n" => {
                    let value = require_value(&mut args, "--questions")?;
                    parsed.questions = parse_number(value, "--questions")?;
                }
                "--minutes" | "-m" => {
                    let value = require_value(&mut args, "--minutes")?;
                    parsed.minutes = parse_number(value, "--minutes")?;
                }
                "--format" => {
                    let value = require_value(&mut args, "--format")?;
                    parsed.mode = match value.as_str() {
                        "auto" => ImportMode::Auto,
                        "json" => ImportMode::Json,
                        "text" => ImportMode::Text,
                        _ => return Err(ArgsError::InvalidFormat { raw: value }),
                    };
                }
                "--out" | "-o" => {
                    parsed.path = Some(PathBuf::from(require_value(&mut args, "--out")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if !arg.starts_with('-') && parsed.path.is_none() => {
                    parsed.path = Some(PathBuf::from(arg));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- exam   [--questions <n>] [--minutes <m>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- import <file> [--format auto|json|text] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- export [--out <file>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- stats  [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- clear  [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:exam.sqlite3");
    eprintln!("  --questions {DEFAULT_QUESTIONS} (5-200), --minutes {DEFAULT_MINUTES} (5-240)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_QUESTIONS, EXAM_MINUTES, RUST_LOG");
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn short_bank_notice(available: usize, requested: u32) -> Option<String> {
    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    (available < requested).then(|| format!("Only {available} questions available."))
}

fn describe_import(outcome: &ImportOutcome) -> String {
    match outcome.format {
        ImportFormat::Json => format!("Imported {} questions (JSON).", outcome.added),
        ImportFormat::Text if outcome.skipped > 0 => format!(
            "Imported {} questions (text); skipped {} unrecognized blocks.",
            outcome.added, outcome.skipped
        ),
        ImportFormat::Text => format!("Imported {} questions (text).", outcome.added),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means take an exam.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Exam,
        Some("--help" | "-h" | "help") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Exam,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite here so core/services stay storage-agnostic.
    tracing::debug!(db_url = %parsed.db_url, command = ?cmd, "database resolved");
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let bank = BankService::new(Arc::clone(&storage.store));

    match cmd {
        Command::Exam => {
            let mut controller = ExamController::new(bank).with_clock(Clock::system());
            match controller
                .start_session(parsed.questions, parsed.minutes)
                .await
            {
                Ok(session) => {
                    if let Some(notice) =
                        short_bank_notice(session.len(), session.settings().question_count())
                    {
                        println!("{notice}");
                    }
                }
                Err(ExamError::EmptyBank) => {
                    println!("No questions yet. Import questions first: app import <file>");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
            let mut lines = terminal::spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
            match terminal::run_exam(&mut controller, &mut lines).await? {
                terminal::LoopExit::Abandoned => {
                    tracing::info!("exam abandoned without scoring");
                    println!("Exam abandoned.");
                }
                terminal::LoopExit::Finished => tracing::debug!("exam loop finished"),
            }
            Ok(())
        }
        Command::Import => {
            let path = parsed.path.ok_or(ArgsError::MissingPath { command: "import" })?;
            let text = tokio::fs::read_to_string(&path).await?;
            tracing::debug!(path = %path.display(), mode = ?parsed.mode, "importing questions");
            let outcome = match parsed.mode {
                ImportMode::Auto => bank.import(&text).await?,
                ImportMode::Text => bank.import_text(&text).await?,
                ImportMode::Json => ImportOutcome {
                    format: ImportFormat::Json,
                    added: bank.import_json(&text).await?,
                    skipped: 0,
                },
            };
            tracing::info!(
                format = ?outcome.format,
                added = outcome.added,
                skipped = outcome.skipped,
                "bank import finished"
            );
            println!("{}", describe_import(&outcome));
            println!("Bank now holds {} questions.", bank.count().await?);
            Ok(())
        }
        Command::Export => {
            let json = bank.export_json().await?;
            match parsed.path {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    println!("Exported bank to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::Stats => {
            let count = bank.count().await?;
            println!("{count} questions in bank");
            if count == 0 {
                println!("Import questions first: app import <file>");
            }
            Ok(())
        }
        Command::Clear => {
            bank.clear().await?;
            println!("Question bank cleared.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
