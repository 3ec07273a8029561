use std::fmt;

use exam_core::model::{Bank, QuestionRecord};
use serde_json::Value;
use storage::repository::{BANK_KEY, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    questions: u32,
    append: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuestions { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("EXAM_DB_URL").unwrap_or_else(|_| "sqlite:exam.sqlite3".into());
        let mut questions = 12;
        let mut append = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--append" => append = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            questions,
            append,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite:exam.sqlite3)");
    eprintln!("  --questions <n>     Arithmetic questions to generate (default: 12)");
    eprintln!("  --append            Keep the existing bank and add to it");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL");
}

fn sample_question(i: u32) -> Result<QuestionRecord, exam_core::model::QuestionError> {
    let a = i + 2;
    let b = (i * 7) % 11 + 1;
    let sum = a + b;
    let options = vec![
        (sum - 1).to_string(),
        sum.to_string(),
        (sum + 1).to_string(),
        (sum + 10).to_string(),
    ];
    QuestionRecord::new(
        format!("Seed #{}: what is {a} + {b}?", i + 1),
        options,
        1,
        Some(format!("{a} + {b} = {sum}")),
    )
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let mut raw: Vec<Value> = Vec::new();
    if args.append {
        if let Some(existing) = storage.store.get(BANK_KEY).await? {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&existing) {
                raw = items;
            }
        }
    }

    let seeded = (0..args.questions)
        .map(sample_question)
        .collect::<Result<Vec<_>, _>>()?;
    raw.extend(Bank::sanitize(seeded).to_raw());

    let text = serde_json::to_string_pretty(&raw)?;
    storage.store.put(BANK_KEY, &text).await?;

    println!(
        "Seeded {} questions ({} total) into {}",
        args.questions,
        raw.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
