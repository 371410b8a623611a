use std::fmt;
use std::path::PathBuf;

use quiz_core::model::UserId;
use services::{AppServices, Clock};
use storage::bank::{self, QuestionBank};
use tokio::io::{AsyncBufReadExt, BufReader};

mod keyboard;
mod render;
mod telemetry;

use keyboard::Keyboard;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidChatId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidChatId { raw } => write!(f, "invalid --chat-id value: {raw}"),
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

struct Args {
    db_url: String,
    chat_id: UserId,
    bank_path: PathBuf,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- chat [--db <sqlite_url>] [--chat-id <id>]");
    eprintln!("  cargo run -p app -- seed [--db <sqlite_url>] [--bank <questions.toml>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  --chat-id 1");
    eprintln!("  --bank data/questions.toml");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_CHAT_ID, QUIZ_BANK_PATH, QUIZ_LOG, QUIZ_LOG_FORMAT");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Chat,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "chat" => Some(Self::Chat),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut chat_id = std::env::var("QUIZ_CHAT_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or(UserId::new(1));
        let mut bank_path = std::env::var("QUIZ_BANK_PATH")
            .map_or_else(|_| PathBuf::from("data/questions.toml"), PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--chat-id" => {
                    let value = require_value(args, "--chat-id")?;
                    chat_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidChatId { raw: value.clone() })?;
                }
                "--bank" => {
                    bank_path = PathBuf::from(require_value(args, "--bank")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            chat_id,
            bank_path,
        })
    }
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Chat is the default when no subcommand is given.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Chat,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Chat,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    telemetry::init_tracing();

    // Open + migrate SQLite here so services stay storage-agnostic.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system()).await?;

    match cmd {
        Command::Seed => {
            let bank = QuestionBank::from_path(&parsed.bank_path)?;
            let written = bank::seed(services.storage(), bank).await?;
            println!(
                "seeded {written} questions from {} into {}",
                parsed.bank_path.display(),
                parsed.db_url
            );
            Ok(())
        }
        Command::Chat => chat(&services, parsed.chat_id).await,
    }
}

/// Line-oriented chat on stdin/stdout for a single chat id.
async fn chat(services: &AppServices, user: UserId) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = services.quiz();
    let language = services
        .storage()
        .users
        .language(user)
        .await?
        .unwrap_or_default();
    let mut keyboard = Keyboard::new(language);
    tracing::info!(user = %user, %language, "chat started");
    println!("Type /start to begin, /help for commands. Ctrl-D exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let (section_hint, action) = keyboard.action_for(&line);
        let outcomes = quiz.handle_action(user, section_hint, action).await;
        keyboard.observe(&outcomes);
        for outcome in &outcomes {
            let text = render::render(outcome, keyboard.language());
            if !text.is_empty() {
                println!("{text}\n");
            }
        }
    }
    Ok(())
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

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // Binary glue: print once and exit.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_become_absolute() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.db".into()),
            "sqlite:///tmp/quiz.db"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/quiz.db".into()),
            "sqlite:///var/quiz.db"
        );
        assert!(normalize_sqlite_url("quiz.db".into()).starts_with("sqlite:///"));
    }

    #[test]
    fn args_accept_negative_chat_ids() {
        let mut args = ["--chat-id", "-1001", "--bank", "bank.toml"]
            .into_iter()
            .map(String::from);
        let parsed = Args::parse(&mut args).unwrap();
        assert_eq!(parsed.chat_id, UserId::new(-1001));
        assert_eq!(parsed.bank_path, PathBuf::from("bank.toml"));
    }

    #[test]
    fn missing_flag_value_is_reported() {
        let mut args = ["--db"].into_iter().map(String::from);
        assert!(matches!(
            Args::parse(&mut args),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
    }
}
