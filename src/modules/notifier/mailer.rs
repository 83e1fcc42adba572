//! Outbound mail port.

use async_trait::async_trait;
use lending_kernel::settings::MailSettings;

/// Delivers one message to a batch of recipients, succeeding or failing as a unit.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mails(&self, message: &str, recipients: &[String]) -> anyhow::Result<()>;
}

/// Mailer that records each batch in the service log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
    subject: String,
}

impl LogMailer {
    pub fn from_settings(settings: &MailSettings) -> Self {
        Self {
            sender: settings.sender.clone(),
            subject: settings.subject.clone(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_mails(&self, message: &str, recipients: &[String]) -> anyhow::Result<()> {
        if recipients.is_empty() {
            anyhow::bail!("mail batch has no recipients");
        }
        tracing::info!(
            from = %self.sender,
            subject = %self.subject,
            recipients = ?recipients,
            body_len = message.len(),
            "mail batch dispatched"
        );
        Ok(())
    }
}
