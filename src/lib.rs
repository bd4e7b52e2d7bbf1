pub mod classifier;
pub mod commands;
pub mod db;
pub mod frontend;
pub mod models;
pub mod settings;
mod utils;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use classifier::{shared_model, DeviceSetting, SentimentModel};
use colored::Colorize;
use db::{Database, DEFAULT_HISTORY_LIMIT};
use directories::ProjectDirs;
use log::LevelFilter;
use settings::SettingsStore;

const ENABLE_LOGS: bool = true;

const DB_FILE_NAME: &str = "history.db";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// What the front-end works with: the store and the loaded model.
pub struct AppState<'a> {
    pub db: Database,
    pub model: &'a dyn SentimentModel,
}

impl<'a> AppState<'a> {
    pub fn new(db: Database, model: &'a dyn SentimentModel) -> Self {
        Self { db, model }
    }
}

/// Classify Vietnamese sentences and keep a local history of the results.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the history database and settings.json
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// History database file (default: <data-dir>/history.db)
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,

    /// Hugging Face model repository for this run
    #[arg(long, value_name = "REPO", global = true)]
    model: Option<String>,

    /// Inference device for this run: `cpu` or `cuda:N`
    #[arg(long, value_name = "DEVICE", global = true)]
    device: Option<DeviceSetting>,

    /// Write --model/--device into settings.json
    #[arg(long, global = true)]
    save_settings: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive session (default)
    Interactive,

    /// Print the most recent results and exit
    History {
        /// Number of rows to show
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    utils::logging::init(LevelFilter::Info);

    let cli = Cli::parse();

    crate::log_info!("vnsentiment starting up...");

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("", "", "vnsentiment")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| anyhow!("no home directory available; pass --data-dir"))?,
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let mut settings_store = SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?;
    let mut model_settings = settings_store.model();
    if let Some(repo_id) = cli.model.clone() {
        model_settings.repo_id = repo_id;
    }
    if let Some(device) = cli.device {
        model_settings.device = device;
    }
    if cli.save_settings {
        settings_store.update_model(model_settings.clone())?;
        crate::log_info!("Saved model settings");
    }

    let db_path = cli.db.clone().unwrap_or_else(|| data_dir.join(DB_FILE_NAME));
    let database = Database::new(db_path)?;
    let stored = database.count_sentiments()?;
    crate::log_info!("History holds {stored} results");

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::History { limit, json } => {
            let entries = database.recent_history(limit)?;
            let mut stdout = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut stdout, &entries)?;
                writeln!(stdout)?;
            } else {
                frontend::render::history(&mut stdout, &entries)?;
            }
            Ok(())
        }
        Commands::Interactive => {
            println!("{}", "Loading model...".dimmed());
            let model = match shared_model(&model_settings) {
                Ok(model) => model,
                Err(err) => {
                    eprintln!("{}", format!("MODEL LOAD ERROR: {err}").red().bold());
                    return Err(anyhow!(err).context("failed to load sentiment model"));
                }
            };

            let state = AppState::new(database, model);
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            frontend::run_session(&state, stdin.lock(), &mut stdout)
        }
    }
}
