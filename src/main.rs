use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use chatfolders::app::App;
use chatfolders::config::Config;
use chatfolders::event_loop::run_app;
use chatfolders::folders::FolderStore;
use chatfolders::host::HostPage;
use chatfolders::inject::AssignMode;
use chatfolders::storage::JsonFileStorage;

/// Sort a chat sidebar into folders.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Saved sidebar markup to load as the host page (re-rendered on change)
    #[arg(long, value_name = "FILE")]
    host: PathBuf,

    /// Folder storage file [default: <data dir>/chatfolders/storage.json]
    #[arg(long, value_name = "FILE")]
    storage: Option<PathBuf>,

    /// How assign controls are attached to rows
    #[arg(long, value_enum)]
    assign_mode: Option<AssignMode>,

    /// Config file [default: <config dir>/chatfolders/config.json]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !io::stdin().is_terminal() {
        anyhow::bail!("chatfolders must be run in an interactive terminal");
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    if let Some(mode) = cli.assign_mode {
        config.assign_mode = mode;
    }

    let storage_path = match cli.storage.or_else(|| config.storage_path.clone()) {
        Some(path) => path,
        None => JsonFileStorage::default_path()?,
    };
    init_tracing(&log_file_path(&storage_path))?;
    info!(host = %cli.host.display(), storage = %storage_path.display(), mode = ?config.assign_mode, "starting");

    let host = HostPage::load(&cli.host, config.host_menu_delay())?;
    let mut storage = JsonFileStorage::open(storage_path)?;
    storage.watch().context("Failed to watch storage file")?;
    let store = FolderStore::new(Box::new(storage));

    let mut app = App::new(config, host, store, Instant::now())
        .context("Failed to initialize application")?;
    app.config_path = Some(config_path);
    app.watch_host().context("Failed to watch host snapshot")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode - are you in a terminal?")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal (always try to restore even on error)
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    info!("exiting");
    result
}

/// Log to a file next to the storage file; the terminal belongs to the UI.
fn init_tracing(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CHATFOLDERS_LOG")
                .unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    Ok(())
}

fn log_file_path(storage_path: &Path) -> PathBuf {
    storage_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("chatfolders.log")
}
