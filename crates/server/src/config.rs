use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use services::{Providers, RemoteExplanationClient};

#[derive(Parser, Debug)]
#[command(version, about = "Classroom quiz server and terminal quiz")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Take a quiz in the terminal.
    Play(PlayArgs),
}

/// Where content and scores live.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// SQLite database URL or file path.
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3")]
    pub db_url: String,

    /// JSON content document (classes, terms, subjects, topics, questions).
    #[arg(long, env = "QUIZ_CONTENT", default_value = "db.json")]
    pub content: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// The address to bind to.
    #[arg(short, long, env = "QUIZ_ADDRESS", default_value = "127.0.0.1:5000")]
    pub address: String,

    /// Front-end origin allowed to call the API; repeat for several.
    #[arg(
        long = "allowed-origin",
        env = "QUIZ_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = [
            "http://localhost:5173".to_string(),
            "http://127.0.0.1:5173".to_string(),
        ]
    )]
    pub allowed_origins: Vec<String>,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long = "class")]
    pub class_id: Option<String>,

    #[arg(long = "term")]
    pub term_id: Option<String>,

    #[arg(long = "subject")]
    pub subject_id: Option<String>,

    #[arg(long = "topic")]
    pub topic_id: Option<String>,

    /// Name saved with the score; asked for when omitted.
    #[arg(long)]
    pub name: Option<String>,

    /// Fetch deeper explanations from a running quiz server instead of
    /// calling the AI provider directly.
    #[arg(long, env = "QUIZ_EXPLAIN_URL")]
    pub explain_url: Option<String>,
}

impl PlayArgs {
    /// Providers from the environment, with explanations routed to
    /// `--explain-url` when given.
    #[must_use]
    pub fn providers(&self) -> Providers {
        let mut providers = Providers::from_env();
        if let Some(url) = self.explain_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            providers.explanations = Arc::new(RemoteExplanationClient::new(url.trim_end_matches('/')));
        }
        providers
    }
}

/// Turn a bare path into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if ["sqlite::memory:", "sqlite://", "sqlite:file:"]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
    {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the parent directory of a file-backed database.
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be created.
pub fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_full_urls_are_kept() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.sqlite3"),
            "sqlite:///tmp/quiz.sqlite3"
        );
    }

    #[test]
    fn bare_paths_become_absolute_urls() {
        assert_eq!(
            normalize_sqlite_url("/var/lib/quiz.db"),
            "sqlite:///var/lib/quiz.db"
        );
        let relative = normalize_sqlite_url("sqlite:data/quiz.db");
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("data/quiz.db"));
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["quiz-server", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.allowed_origins.len(), 2);
        assert_eq!(args.store.content, PathBuf::from("db.json"));
    }

    #[test]
    fn play_takes_selection_flags() {
        let cli = Cli::try_parse_from([
            "quiz-server", "play", "--class", "1", "--term", "1", "--subject", "2", "--topic", "5",
        ])
        .unwrap();
        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.topic_id.as_deref(), Some("5"));
        assert!(args.name.is_none());
    }

    #[test]
    fn explain_url_selects_remote_explanations() {
        let cli = Cli::try_parse_from([
            "quiz-server", "play", "--explain-url", "http://127.0.0.1:5000/",
        ])
        .unwrap();
        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.providers().explanations.name(), "remote");
    }
}
