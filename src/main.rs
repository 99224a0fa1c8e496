mod analytics;
mod config;
mod db;
mod error;
mod models;
mod run;
mod sample;
mod service;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::from_env()?;
    init_tracing(&config.log_filter);

    config.ensure_data_dir()?;
    let mut db = db::Database::open(&config.db_path)?;

    run::as_cli(&args, &mut db)
}

/// Log to stderr so command output on stdout stays machine-readable.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
