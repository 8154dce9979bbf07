use clap::Parser;
use color_eyre::eyre::WrapErr;
use quiz_core::model::SelectionDraft;
use quiz_server::config::{
    Cli, Command, PlayArgs, ServeArgs, StoreArgs, normalize_sqlite_url, prepare_sqlite_dir,
};
use quiz_server::play::{PlayOutcome, TerminalQuiz};
use quiz_server::{AppState, router};
use services::{AppServices, Clock, Providers};
use storage::content::load_content_file;
use tracing::info;

const DEFAULT_LOG_FILTER: &str = "quiz_server=debug,services=info,tower=info";

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Play(args) => play(args).await,
    }
}

async fn load_services(store: &StoreArgs, providers: Providers) -> color_eyre::Result<AppServices> {
    let db_url = normalize_sqlite_url(&store.db_url);
    prepare_sqlite_dir(&db_url).wrap_err_with(|| format!("cannot create directory for {db_url}"))?;
    let content = load_content_file(&store.content).await?;
    let services = AppServices::new_sqlite(&db_url, content, Clock::system(), providers)
        .await
        .wrap_err_with(|| format!("cannot open {db_url}"))?;
    Ok(services)
}

async fn serve(args: ServeArgs) -> color_eyre::Result<()> {
    let services = load_services(&args.store, Providers::from_env()).await?;
    let listener = tokio::net::TcpListener::bind(args.address.as_str())
        .await
        .wrap_err_with(|| format!("cannot bind {}", args.address))?;
    let address = listener.local_addr()?;

    let state = AppState::new(services, args.allowed_origins, format!("http://{address}"));
    info!(%address, origins = ?state.allowed_origins, "quiz server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("quiz server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn play(args: PlayArgs) -> color_eyre::Result<()> {
    let services = load_services(&args.store, args.providers()).await?;
    let selection = SelectionDraft {
        class_id: args.class_id,
        term_id: args.term_id,
        subject_id: args.subject_id,
        topic_id: args.topic_id,
    };

    let quiz = services.quiz_loop();
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut terminal = TerminalQuiz::new(quiz.as_ref(), stdin.lock(), stdout.lock());
    match terminal.run(&selection, args.name).await? {
        PlayOutcome::Abandoned => info!("quiz abandoned"),
        PlayOutcome::Unsaved => info!("quiz finished without saving"),
        PlayOutcome::Saved(outcome) => {
            info!(id = outcome.stored().id, duplicate = outcome.is_duplicate(), "score saved");
        }
    }
    Ok(())
}
