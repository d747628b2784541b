use log::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not send email to {recipient}: {reason}")]
pub struct MailError {
    pub recipient: String,
    pub reason: String,
}

/// Outgoing mail. SMTP dispatch lives behind this trait so that the auth flows can be exercised without a mail server.
#[allow(async_fn_in_trait)]
pub trait Mailer {
    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), MailError>;
}

/// A [`Mailer`] that writes every message to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new<S: Into<String>>(from: S) -> Self {
        Self { from: from.into() }
    }
}

impl Default for LogMailer {
    fn default() -> Self {
        Self::new("info@widgets.com")
    }
}

impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), MailError> {
        info!("📬️ Password reset mail from {} to {to}: {link}", self.from);
        Ok(())
    }
}
