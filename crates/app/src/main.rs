use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use log::info;
use practice_core::model::{AuthIdentity, UserId};
use services::{AppConfig, AppServices, Backend, Clock, DEFAULT_HISTORY_LIMIT, PracticeService};
use storage::rest::RestConfig;
use ui::{App, UiApp, build_app_context};

const DEFAULT_DB_URL: &str = "sqlite://asvab.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUser { raw: String },
    InvalidHistoryLimit { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidHistoryLimit { raw } => {
                write!(f, "invalid --history-limit value: {raw}")
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

struct DesktopApp {
    practice: Arc<PracticeService>,
    backend_label: String,
}

impl UiApp for DesktopApp {
    fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    fn backend_label(&self) -> String {
        self.backend_label.clone()
    }
}

struct Args {
    db_url: Option<String>,
    identity: Option<AuthIdentity>,
    history_limit: u32,
    demo: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>       Local results cache (default: {DEFAULT_DB_URL})");
    eprintln!("  --no-cache              Do not keep results on this device");
    eprintln!("  --user <id>             Sign in as this user id");
    eprintln!("  --email <address>       Email shown for the signed-in user");
    eprintln!("  --history-limit <n>     Past results to show (default: {DEFAULT_HISTORY_LIMIT})");
    eprintln!("  --demo                  Use the in-process demo backend");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ASVAB_SUPABASE_URL, ASVAB_SUPABASE_ANON_KEY, ASVAB_SUPABASE_ACCESS_TOKEN");
    eprintln!("  ASVAB_DB_URL, ASVAB_USER_ID, ASVAB_USER_EMAIL, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = Some(
            std::env::var("ASVAB_DB_URL")
                .ok()
                .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url),
        );
        let mut user = non_blank_var("ASVAB_USER_ID");
        let mut email = non_blank_var("ASVAB_USER_EMAIL");
        let mut history_limit = DEFAULT_HISTORY_LIMIT;
        let mut demo = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                "--no-cache" => db_url = None,
                "--user" => user = Some(require_value(args, "--user")?),
                "--email" => email = Some(require_value(args, "--email")?),
                "--history-limit" => {
                    let value = require_value(args, "--history-limit")?;
                    history_limit = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidHistoryLimit { raw: value.clone() })?;
                }
                "--demo" => demo = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let identity = match user {
            Some(raw) => {
                let user_id =
                    UserId::new(raw.clone()).map_err(|_| ArgsError::InvalidUser { raw })?;
                Some(AuthIdentity::new(user_id, email))
            }
            None => None,
        };

        Ok(Self {
            db_url,
            identity,
            history_limit,
            demo,
        })
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its directory so the pool can open it.
fn prepare_sqlite_file(db_url: &str) -> Result<(), ArgsError> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_string(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|_| invalid())?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|_| invalid())?;
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let backend = if args.demo {
        Backend::Demo
    } else {
        RestConfig::from_env()?.map_or(Backend::Demo, Backend::Rest)
    };
    if let Some(url) = args.db_url.as_deref() {
        prepare_sqlite_file(url)?;
    }

    let mut config = AppConfig::new(backend);
    config.local_db_url = args.db_url;
    config.identity = args.identity;
    config.history_limit = args.history_limit;

    let services = AppServices::bootstrap(config, Clock::default_clock()).await?;
    match services.practice().identity() {
        Some(identity) => info!("signed in as {}", identity.display_name()),
        None => info!("no user configured; results will not be saved"),
    }
    info!("history shows up to {} results", services.practice().history_limit());

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        practice: services.practice(),
        backend_label: services.backend_label().to_string(),
    });
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("ASVAB Practice")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
