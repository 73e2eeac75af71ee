//! Outgoing email for the contact form.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::config::MailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail provider returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    /// Address replies should go to, typically the visitor's.
    pub reply_to: Option<String>,
}

impl OutgoingMail {
    pub fn contact(name: &str, email: &str, message: &str) -> Self {
        Self {
            subject: format!("Contact Form: {name}"),
            body: format!("From: {name} <{email}>\n\n{message}"),
            reply_to: Some(email.to_string()),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Pick the mailer `config` allows: the HTTP provider when an API key,
/// sender and recipient are all set, otherwise a logger.
pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match (&config.api_key, &config.sender, &config.recipient) {
        (Some(key), Some(sender), Some(recipient)) if !key.trim().is_empty() => {
            Arc::new(HttpMailer::new(
                config.api_url.clone(),
                key.clone(),
                sender.clone(),
                recipient.clone(),
            ))
        }
        _ => {
            warn!("Mail provider not configured; contact messages will only be logged");
            Arc::new(LogMailer)
        }
    }
}

/// Sends through a SendGrid v3 compatible `mail/send` endpoint.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    sender: String,
    recipient: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, sender: String, recipient: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            sender,
            recipient,
        }
    }

    fn payload(&self, mail: &OutgoingMail) -> serde_json::Value {
        let mut payload = json!({
            "personalizations": [{ "to": [{ "email": self.recipient }] }],
            "from": { "email": self.sender },
            "subject": mail.subject,
            "content": [{ "type": "text/plain", "value": mail.body }],
        });
        if let Some(reply_to) = &mail.reply_to {
            payload["reply_to"] = json!({ "email": reply_to });
        }
        payload
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    #[instrument(skip(self, mail), fields(subject = %mail.subject))]
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.payload(mail))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status, message });
        }

        info!("Mail sent");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        info!(subject = %mail.subject, body = %mail.body, "Mail not sent (no provider configured)");
        Ok(())
    }
}
