mod config;
mod domain;
mod infra;
mod usecase;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::blocking::Client;
use tracing::info;

use crate::config::{AppConfig, Cli};
use crate::infra::google::auth::{ServiceAccountKey, TokenProvider, SPREADSHEETS_SCOPE};
use crate::infra::google::sheets::GoogleSheetsClient;
use crate::infra::notify::build_notifier;
use crate::usecase::services::sync_service::SyncService;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let config = AppConfig::from_cli(Cli::parse())?;

    let http = Client::builder()
        .timeout(config.sheets.timeout)
        .build()
        .context("failed to build http client")?;
    let key = ServiceAccountKey::from_file(&config.sheets.credentials_path)?;
    info!(client_email = %key.client_email, "loaded service account key");
    let tokens = TokenProvider::new(key, SPREADSHEETS_SCOPE, http.clone());
    let sheets = GoogleSheetsClient::new(http.clone(), &config.sheets.base_url, tokens)?;
    let notifier = build_notifier(&config.notify, http)?;

    let service = SyncService::new(Arc::new(sheets), notifier);
    let mut stdout = std::io::stdout().lock();
    let outcome = service.run(&config.job, &mut stdout)?;
    writeln!(stdout, "{}", outcome.updated_line()).context("failed to write summary")?;

    Ok(())
}
