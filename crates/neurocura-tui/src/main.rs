use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use neurocura_config::{Config, ConfigManager, LogLevel};
use neurocura_core::{ChatController, RequestDispatcher};
use neurocura_llm::{create_gateway, ProviderConfig};
use neurocura_observability::LogManager;
use neurocura_session::{JsonFileStore, JsonFileStoreConfig, SessionManager};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

mod app;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "neurocura")]
#[command(about = "Neurocura: a terminal assistant for neurological health information")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, env = "NEUROCURA_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding session files
    #[arg(long, env = "NEUROCURA_SESSIONS_DIR")]
    sessions_dir: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "NEUROCURA_LOG_LEVEL")]
    log_level: Option<LogLevel>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.sessions_dir {
            config.storage.path = dir.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => ConfigManager::default_config_path()?,
    };
    let manager = ConfigManager::load(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let config_file = manager.path().to_path_buf();
    let mut config = manager.into_config();
    cli.apply_overrides(&mut config);
    ConfigManager::validate(&config)?;

    let log_manager = LogManager::init(&config.logging).await?;
    info!(
        config = %config_file.display(),
        log_file = ?log_manager.log_file(),
        "Neurocura {} starting",
        env!("CARGO_PKG_VERSION")
    );

    let credentials = config.llm.api_key().unwrap_or_default();
    if credentials.is_empty() {
        warn!(
            "Environment variable {} is not set; requests will fail until it is",
            config.llm.api_key_env
        );
    }

    let gateway = create_gateway(ProviderConfig::from(&config.llm))?;

    let mut store_config = JsonFileStoreConfig::new(&config.storage.path);
    store_config.pretty = config.storage.pretty;
    let store = JsonFileStore::new(store_config)
        .await
        .context("Failed to open session directory")?;
    let (sessions, report) = SessionManager::open(Arc::new(store)).await?;

    let controller = ChatController::new(sessions, RequestDispatcher::new(gateway, credentials));
    let mut app = App::new(controller, &report, config.llm.model.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match &res {
        Ok(()) => info!("Neurocura exiting"),
        Err(err) => tracing::error!("Neurocura exiting with error: {:#}", err),
    }
    res
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> anyhow::Result<()> {
    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = app.handle_key(key).await {
                    app.show_error(&e);
                }
            }
        }

        app.on_tick().await;

        if app.should_quit {
            return Ok(());
        }
    }
}
