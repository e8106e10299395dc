mod app;
mod handler;
mod jobs;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use flowdeck_core::{
    build_service, Assistant, ClaudeClient, Config, OllamaClient, OpenAIClient, Provider,
    SessionStore, Workspace,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use tui::{EventHandler, Tui};

const LOG_ENV: &str = "FLOWDECK_LOG";

#[derive(Parser)]
#[command(name = "flowdeck", version)]
#[command(about = "Interview, plan and draft a project with an AI collaborator")]
struct Cli {
    /// AI provider: ollama, claude or openai
    #[arg(short, long, env = "FLOWDECK_PROVIDER")]
    provider: Option<String>,

    /// Model to use (defaults to the provider's default)
    #[arg(short, long)]
    model: Option<String>,

    /// Where the session database and log live
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Clear the stored session before starting
    #[arg(long)]
    reset: bool,

    /// List the provider's models and exit
    #[arg(long)]
    list_models: bool,
}

/// Log to a file: the terminal belongs to the UI
fn init_logging(data_dir: &Path, verbose: bool) -> Result<()> {
    let path = data_dir.join("flowdeck.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).with_target(false))
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => Config::data_dir()?,
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    init_logging(&data_dir, cli.verbose)?;

    let config = Config::load_or_create().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Config unreadable, using defaults");
        Config::new()
    });

    let provider = match cli.provider.as_deref() {
        Some(name) => {
            Provider::from_str(name).ok_or_else(|| anyhow!("Unknown provider '{}'", name))?
        }
        None => config.provider(),
    };
    if cli.list_models {
        return list_models(&config, provider).await;
    }

    // A model configured for another provider would not resolve
    let model = cli
        .model
        .or_else(|| (provider != config.provider()).then(|| provider.default_model().to_string()));
    let assistant = Assistant::new(build_service(&config, provider, model.as_deref())?);

    let store = SessionStore::open(&data_dir.join("session.db"))?;
    if cli.reset {
        store.clear()?;
        tracing::info!("Stored session cleared");
    }
    let workspace = Workspace::open(store, config.autosave_debounce())?;
    let mut app = App::new(workspace, assistant, config.intervention_interval());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    app.shutdown()?;
    result
}

async fn list_models(config: &Config, provider: Provider) -> Result<()> {
    let models = match provider {
        Provider::Ollama => OllamaClient::new(&config.ollama_url(), provider.default_model())
            .list_models()
            .await
            .context("Could not reach Ollama. Make sure it is running with: ollama serve")?,
        Provider::Claude => ClaudeClient::list_models(),
        Provider::OpenAI => OpenAIClient::list_models(),
    };

    println!("{} models:", provider.display_name());
    for model in models {
        println!("  • {}", model);
    }
    Ok(())
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
