use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use thiserror::Error;

use crate::infra::google::sheets::DEFAULT_SHEETS_BASE_URL;
use crate::infra::notify::slack::DEFAULT_SLACK_API_URL;
use crate::usecase::ports::sheets::SheetTarget;
use crate::usecase::services::sync_service::SyncJob;

pub const DEFAULT_CREDENTIALS_FILE: &str = "./credentials.json";
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    Slack,
    Email,
    None,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "sheet-sync")]
#[command(about = "Upload a CSV file to a Google Sheet and report what changed")]
#[command(version)]
pub struct Cli {
    #[arg(help = "The ID of the spreadsheet")]
    pub spreadsheet_id: String,
    #[arg(help = "Path to the CSV file")]
    pub csv_file: PathBuf,
    #[arg(help = "Name of the sheet (range) to read and overwrite")]
    pub sheet_name: String,
    #[arg(help = "Numeric ID of the sheet, used for column resizing", allow_negative_numbers = true)]
    pub sheet_id: i64,

    #[arg(long, env = "SHEET_SYNC_CREDENTIALS", help = "Service account key file")]
    pub credentials: Option<PathBuf>,
    #[arg(long, env = "SHEET_SYNC_DELIMITER", default_value = ",", help = "Single-byte field delimiter")]
    pub delimiter: String,
    #[arg(long, env = "SHEET_SYNC_TIMEOUT_SECS", default_value_t = 30, help = "HTTP request timeout")]
    pub timeout_secs: u64,
    #[arg(long, help = "Do not auto-resize columns after writing")]
    pub skip_resize: bool,

    #[arg(long, value_enum, env = "SHEET_SYNC_NOTIFY", default_value = "slack", help = "Where change reports go")]
    pub notify: SinkKind,
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub slack_token: Option<String>,
    #[arg(long, env = "SLACK_CHANNEL_ID")]
    pub slack_channel: Option<String>,
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,
    #[arg(long, env = "SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,
    #[arg(long, env = "SMTP_USERNAME", help = "SMTP login, also used as the sender address")]
    pub smtp_username: Option<String>,
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,
    #[arg(long, env = "MAIL_TO")]
    pub mail_to: Option<String>,
    #[arg(long, env = "MAIL_SUBJECT", default_value = "AWS Asset Inventory Alert")]
    pub mail_subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    pub token: String,
    pub channel_id: String,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub to: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyConfig {
    Slack(SlackConfig),
    Email(EmailConfig),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub credentials_path: PathBuf,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub job: SyncJob,
    pub sheets: SheetsConfig,
    pub notify: NotifyConfig,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let delimiter = parse_delimiter(&cli.delimiter)?;
        let credentials_path = match cli.credentials {
            Some(path) => path,
            None => resolve_credentials_path(Path::new(DEFAULT_CREDENTIALS_FILE), config_dir()),
        };

        let notify = match cli.notify {
            SinkKind::None => NotifyConfig::Disabled,
            SinkKind::Slack => NotifyConfig::Slack(SlackConfig {
                token: required(cli.slack_token, "--slack-token / SLACK_TOKEN")?,
                channel_id: required(cli.slack_channel, "--slack-channel / SLACK_CHANNEL_ID")?,
                api_url: DEFAULT_SLACK_API_URL.to_string(),
            }),
            SinkKind::Email => NotifyConfig::Email(EmailConfig {
                host: required(cli.smtp_host, "--smtp-host / SMTP_HOST")?,
                port: cli.smtp_port,
                username: required(cli.smtp_username, "--smtp-username / SMTP_USERNAME")?,
                password: required(cli.smtp_password, "--smtp-password / SMTP_PASSWORD")?,
                to: required(cli.mail_to, "--mail-to / MAIL_TO")?,
                subject: cli.mail_subject,
            }),
        };

        Ok(AppConfig {
            job: SyncJob {
                csv_path: cli.csv_file,
                delimiter,
                target: SheetTarget {
                    spreadsheet_id: cli.spreadsheet_id,
                    range: cli.sheet_name,
                    sheet_id: cli.sheet_id,
                },
                resize_columns: !cli.skip_resize,
            },
            sheets: SheetsConfig {
                credentials_path,
                base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
                timeout: Duration::from_secs(cli.timeout_secs),
            },
            notify,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    let raw = if raw == "\\t" { "\t" } else { raw };
    match raw.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(ConfigError::Invalid {
            name: "delimiter",
            reason: format!("expected a single byte, got {raw:?}"),
        }),
    }
}

fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "sheet-sync", "sheet-sync").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Prefers the relative key file; falls back to the per-user config directory
/// only when the relative file is absent and the fallback exists.
fn resolve_credentials_path(relative: &Path, config_dir: Option<PathBuf>) -> PathBuf {
    if relative.exists() {
        return relative.to_path_buf();
    }
    config_dir
        .map(|dir| dir.join(CREDENTIALS_FILE_NAME))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| relative.to_path_buf())
}
