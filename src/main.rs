use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod error;
mod export;
mod gui;
mod model;
mod preview;
mod session;
mod settings;
mod storage;
mod subjects;
mod theme;

use session::Session;
use settings::{default_base_path, ensure_base_folders, load_or_init_settings, save_settings};
use storage::{FileStorage, SnapshotRepository};

#[derive(Parser, Debug)]
#[command(
    name = "timetable-maker",
    version,
    about = "Staff individual timetable generator (local-first, offline)"
)]
struct CliArgs {
    /// Choose GUI (default) or CLI mode
    #[arg(long, value_enum, default_value = "gui")]
    mode: RunMode,
    /// Override data base path (defaults to ./data next to the exe)
    #[arg(long)]
    base_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RunMode {
    Gui,
    Cli,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let base_path = args.base_path.unwrap_or_else(default_base_path);

    if let Err(e) = ensure_base_folders(&base_path) {
        error!(
            "Failed to create base folders at {}: {}",
            base_path.display(),
            e
        );
        return;
    }

    let mut settings = match load_or_init_settings(&base_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            return;
        }
    };

    info!(path = %base_path.display(), "using data path");

    settings.base_path = base_path.to_string_lossy().to_string();
    settings.mode = match args.mode {
        RunMode::Gui => "gui".to_string(),
        RunMode::Cli => "cli".to_string(),
    };

    let storage = FileStorage::open_in(&base_path);
    info!(file = %storage.path().display(), "opened timetable storage");
    let mut session = Session::restore(SnapshotRepository::new(storage));

    match args.mode {
        RunMode::Gui => {
            if let Err(e) = gui::launch_gui(base_path.clone(), settings.clone(), session) {
                error!("Failed to start GUI: {}", e);
            }
            // The window may have switched themes; keep what it wrote.
            if let Ok(latest) = load_or_init_settings(&base_path) {
                settings.ui = latest.ui;
            }
        }
        RunMode::Cli => {
            cli::run_cli(&mut session, &settings);
        }
    }

    if let Err(e) = save_settings(&settings, &base_path) {
        error!("Could not save settings: {}", e);
    }
}
