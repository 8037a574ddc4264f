//! Outbound email
//!
//! Services send mail through the [`Mailer`] trait. [`LogMailer`] is the
//! default transport and records each message as a `tracing` event.

use async_trait::async_trait;
use std::sync::Mutex;
use thiserror::Error;

/// One outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

impl MailMessage {
    pub fn new(to: &str, subject: &str, text: impl Into<String>) -> Self {
        Self {
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.into(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Transport that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            html = message.html.is_some(),
            "mail dispatched"
        );
        tracing::debug!(body = %message.text, "mail body");
        Ok(())
    }
}

/// Transport that keeps every message in memory
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("mailbox lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}
