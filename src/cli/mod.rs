use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::catalog;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::presets::PresetStore;
use crate::storage;

pub mod commands;

use self::commands::{PresetArgs, SearchArgs, ShowArgs};

#[derive(Parser, Debug)]
#[command(
    name = "hearth",
    version,
    about = "Keyboard-first browser for the HEARTH threat hunting catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over HEARTH_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over HEARTH_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Read hunts from this JSON file instead of the configured dataset
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive browser (default)
    Tui,
    /// Filter, sort and page the catalog and print the result
    Search(SearchArgs),
    /// Print every field of one hunt
    Show(ShowArgs),
    /// Summary counts and the grouped tactic list
    Stats,
    /// List, save or delete filter presets
    Presets(PresetArgs),
}

enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();

    let command = cli.command.unwrap_or(Commands::Tui);
    let log_file = paths.log_dir.join("hearth.log");
    let target = match command {
        Commands::Tui => LogTarget::File(&log_file),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let mut config = loader.load_or_init()?;
    if let Some(path) = cli.dataset {
        config.dataset_path = Some(path);
    } else {
        catalog::ensure_dataset(&config.dataset_path(&paths))?;
    }
    let dataset_path = config.dataset_path(&paths);
    let hunts = catalog::load_from_path(&dataset_path)
        .with_context(|| format!("reading dataset {}", dataset_path.display()))?;

    let storage = storage::init(&paths, &config.storage)?;
    let presets = PresetStore::new(storage);

    let config = Arc::new(config);
    match command {
        Commands::Tui => {
            if !atty::is(atty::Stream::Stdout) {
                bail!("the interactive browser needs a terminal; try `hearth search`");
            }
            let mut app = App::new(config, hunts, presets);
            commands::run_tui(&mut app)
        }
        Commands::Search(args) => commands::search_hunts(&config, hunts, &presets, args),
        Commands::Show(args) => commands::show_hunt(&hunts, args),
        Commands::Stats => commands::print_stats(hunts),
        Commands::Presets(args) => commands::handle_preset_command(&presets, args),
    }
}

fn init_tracing(level: &str, target: LogTarget<'_>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = fmt().with_env_filter(env_filter);
        match target {
            LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
            LogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                builder.with_ansi(false).with_writer(Mutex::new(file)).init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}
