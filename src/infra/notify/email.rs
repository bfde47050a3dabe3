use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::EmailConfig;
use crate::domain::entities::change::ChangeReport;
use crate::usecase::ports::notifier::{ChangeNotifier, NotifyError};

pub const MAIL_INTRO: &str = "Changes detected in AWS Asset Inventory:\n\n";
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlsMode {
    Implicit,
    StartTls,
}

/// 465 wraps the session in TLS from the start; any other port upgrades
/// with STARTTLS.
fn tls_mode(port: u16) -> TlsMode {
    if port == IMPLICIT_TLS_PORT {
        TlsMode::Implicit
    } else {
        TlsMode::StartTls
    }
}

pub fn compose_body(report: &ChangeReport) -> String {
    format!("{MAIL_INTRO}{report}")
}

pub struct EmailNotifier {
    config: EmailConfig,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Addresses are parsed up front so a bad address fails before any
    /// network traffic.
    pub fn new(config: EmailConfig) -> Result<Self, NotifyError> {
        let from = config
            .username
            .parse::<Mailbox>()
            .map_err(|err| NotifyError::Mail(format!("invalid sender {}: {err}", config.username)))?;
        let to = config
            .to
            .parse::<Mailbox>()
            .map_err(|err| NotifyError::Mail(format!("invalid receiver {}: {err}", config.to)))?;
        Ok(Self { config, from, to })
    }

    fn build_message(&self, report: &ChangeReport) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.config.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(compose_body(report))
            .map_err(|err| NotifyError::Mail(err.to_string()))
    }
}

impl ChangeNotifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    fn notify(&self, report: &ChangeReport) -> Result<(), NotifyError> {
        let message = self.build_message(report)?;
        let builder = match tls_mode(self.config.port) {
            TlsMode::Implicit => SmtpTransport::relay(&self.config.host),
            TlsMode::StartTls => SmtpTransport::starttls_relay(&self.config.host),
        };
        let mailer = builder
            .map_err(|err| NotifyError::Mail(err.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        mailer
            .send(&message)
            .map_err(|err| NotifyError::Mail(err.to_string()))?;
        Ok(())
    }
}
