pub mod email;
pub mod slack;

use std::sync::Arc;

use reqwest::blocking::Client;

use crate::config::NotifyConfig;
use crate::infra::notify::email::EmailNotifier;
use crate::infra::notify::slack::SlackNotifier;
use crate::usecase::ports::notifier::{ChangeNotifier, NotifyError};

/// Builds the single sink selected by configuration; `None` disables delivery.
pub fn build_notifier(
    config: &NotifyConfig,
    http: Client,
) -> Result<Option<Arc<dyn ChangeNotifier>>, NotifyError> {
    let notifier: Arc<dyn ChangeNotifier> = match config {
        NotifyConfig::Disabled => return Ok(None),
        NotifyConfig::Slack(slack) => Arc::new(SlackNotifier::new(http, slack.clone())),
        NotifyConfig::Email(email) => Arc::new(EmailNotifier::new(email.clone())?),
    };
    Ok(Some(notifier))
}
