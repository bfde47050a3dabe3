use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::SlackConfig;
use crate::domain::entities::change::ChangeReport;
use crate::usecase::ports::notifier::{ChangeNotifier, NotifyError};

pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack answers 200 with `ok: false` for most rejections.
fn check_response(body: &str) -> Result<(), NotifyError> {
    let response: PostMessageResponse = serde_json::from_str(body)
        .map_err(|err| NotifyError::Rejected(format!("unreadable response: {err}")))?;
    if response.ok {
        Ok(())
    } else {
        Err(NotifyError::Rejected(
            response.error.unwrap_or_else(|| "unknown_error".to_string()),
        ))
    }
}

fn check_delivery(status: StatusCode, body: &str) -> Result<(), NotifyError> {
    if !status.is_success() {
        return Err(NotifyError::Rejected(format!("{status}: {body}")));
    }
    check_response(body)
}

pub struct SlackNotifier {
    http: Client,
    config: SlackConfig,
}

impl SlackNotifier {
    pub fn new(http: Client, config: SlackConfig) -> Self {
        Self { http, config }
    }
}

impl ChangeNotifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn notify(&self, report: &ChangeReport) -> Result<(), NotifyError> {
        let text = report.render();
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.token)
            .json(&PostMessage {
                channel: &self.config.channel_id,
                text: &text,
            })
            .send()?;

        let status = response.status();
        let body = response.text()?;
        check_delivery(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_is_delivered() {
        assert!(check_response(r#"{"ok":true,"channel":"C123","ts":"1.2"}"#).is_ok());
    }

    #[test]
    fn not_ok_response_surfaces_slack_error_code() {
        let err = check_response(r#"{"ok":false,"error":"channel_not_found"}"#)
            .expect_err("should be rejected");

        assert_eq!(err.to_string(), "chat delivery rejected: channel_not_found");
    }

    #[test]
    fn http_failure_is_rejected_with_status_and_body() {
        let err = check_delivery(StatusCode::TOO_MANY_REQUESTS, "rate limited")
            .expect_err("429 should be rejected");

        assert_eq!(
            err.to_string(),
            "chat delivery rejected: 429 Too Many Requests: rate limited"
        );
    }

    #[test]
    fn http_success_still_checks_ok_flag() {
        assert!(check_delivery(StatusCode::OK, r#"{"ok":true}"#).is_ok());
        assert!(matches!(
            check_delivery(StatusCode::OK, r#"{"ok":false,"error":"not_in_channel"}"#),
            Err(NotifyError::Rejected(reason)) if reason == "not_in_channel"
        ));
    }

    #[test]
    fn message_payload_shape() {
        let payload = serde_json::to_value(PostMessage {
            channel: "C123",
            text: "hello",
        })
        .expect("serialize");

        assert_eq!(payload, serde_json::json!({"channel": "C123", "text": "hello"}));
    }
}
