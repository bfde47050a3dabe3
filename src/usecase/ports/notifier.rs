use thiserror::Error;

use crate::domain::entities::change::ChangeReport;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("chat delivery rejected: {0}")]
    Rejected(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail error: {0}")]
    Mail(String),
}

pub trait ChangeNotifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn notify(&self, report: &ChangeReport) -> Result<(), NotifyError>;
}
