use std::fmt;

use chrono::{DateTime, Duration, Utc};
use practice_core::model::{ProgressRecord, ScoreSummary, UserId};
use storage::repository::LocalProgressCache;
use storage::sqlite::SqliteRepository;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    records: u32,
    questions: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUser { raw: String },
    InvalidRecords { raw: String },
    InvalidQuestions { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidRecords { raw } => write!(f, "invalid --records value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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
        let mut db_url = std::env::var("ASVAB_DB_URL")
            .unwrap_or_else(|_| "sqlite:asvab.sqlite3?mode=rwc".into());
        let mut user = std::env::var("ASVAB_USER_ID").unwrap_or_else(|_| "local-user".into());
        let mut records = 5_u32;
        let mut questions = 31_u32;
        let mut now: Option<DateTime<Utc>> = None;

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
                "--user" => {
                    user = require_value(&mut args, "--user")?;
                }
                "--records" => {
                    let value = require_value(&mut args, "--records")?;
                    records = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidRecords { raw: value.clone() })?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let user_id = UserId::new(user.clone()).map_err(|_| ArgsError::InvalidUser { raw: user })?;

        Ok(Self {
            db_url,
            user_id,
            records,
            questions,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:asvab.sqlite3?mode=rwc)");
    eprintln!("  --user <id>               User id the records belong to (default: local-user)");
    eprintln!("  --records <n>             Number of local results to append (default: 5)");
    eprintln!("  --questions <n>           Questions per simulated test (default: 31)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  ASVAB_DB_URL, ASVAB_USER_ID");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;
    let now = args.now.unwrap_or_else(Utc::now);

    for i in 0..args.records {
        let days_ago = i64::from(i) * 2;
        let recorded_at = now - Duration::days(days_ago);
        // Older attempts answer fewer questions and get fewer right.
        let answered = args.questions.saturating_sub(i * 3).max(1);
        let correct = answered.saturating_sub(i * 2 + 2);
        let summary = ScoreSummary::from_counts(correct, answered, args.questions);
        let record = ProgressRecord::from_summary(
            args.user_id.clone(),
            recorded_at,
            &summary,
            600 + i * 45,
        );
        repo.append_record(&record).await?;
    }

    println!(
        "Seeded {} local results for {} into {}",
        args.records, args.user_id, args.db_url
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
