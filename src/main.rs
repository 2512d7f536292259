/// Version injected at compile time via CORRAL_VERSION env var (set by
/// CI/CD), or "dev" for local builds.
pub const VERSION: &str = match option_env!("CORRAL_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use corral::api::auth::Credentials;
use corral::api::client::Client;
use corral::commands::{self, Command};
use corral::config::Config;

/// CLI client for the Corral device-fleet management service
#[derive(Parser, Debug)]
#[command(name = "corral", version, about, long_about = None)]
struct Cli {
    /// Corral service endpoint, e.g. https://corral.example.net
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Pre-issued API token
    #[arg(long, global = true)]
    token: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    else {
        return None;
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("corral {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("corral").join("corral.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".corral").join("corral.log");
    }
    PathBuf::from("corral.log")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _log_guard = setup_logging(cli.log_level);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load();

    // Flags beat environment, which beats the config file
    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| config.effective_endpoint())
        .context("No Corral endpoint configured. Set CORRAL_ENDPOINT or use --endpoint")?;

    tracing::info!("Using endpoint: {}", endpoint);

    let credentials = match &cli.token {
        Some(token) => Credentials::from_token(token),
        None => Credentials::from_config(&config)?,
    };
    let client = Client::new(&endpoint, credentials)?;

    commands::dispatch(cli.command, &client, &config).await
}
