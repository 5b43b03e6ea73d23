//! Outbound notifiers.

use crate::error::NotifyError;
use keg_traits::{BoxError, Notifier};
use serde::Serialize;
use std::time::Duration;

/// Writes messages to the log; used when no webhook is configured.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    channel: String,
}

impl LogNotifier {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) -> Result<(), BoxError> {
        tracing::info!(channel = %self.channel, message, "notification");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    content: &'a str,
}

/// POSTs `{"content": message}` to a chat webhook.
///
/// Uses the blocking client, so call it from a plain thread (the event
/// dispatcher), never from inside an async runtime.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    /// Builds the HTTP client once; it is reused for every message.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn send(&self, message: &str) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&WebhookBody { content: message })
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        tracing::debug!(url = %self.url, status = status.as_u16(), "webhook delivered");
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, message: &str) -> Result<(), BoxError> {
        self.send(message).map_err(Into::into)
    }
}
