//! Outgoing e-mail. Account flows render a template into an [`OutgoingMail`]
//! and hand it to whichever [`Mailer`] the process was started with.

pub mod smtp;
pub mod templates;

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

pub use smtp::SmtpMailer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address '{0}'")]
    Address(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Used when no SMTP relay is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, "smtp not configured, e-mail not delivered");
        Ok(())
    }
}

/// Keeps every message in memory; handy for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.outbox
            .lock()
            .map_err(|_| MailError::Transport("outbox poisoned".to_string()))?
            .push(mail);
        Ok(())
    }
}
