//! Telegram alerting, best effort.

use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// How loud an alert is; prefixes the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Routine notification.
    Info,
    /// Needs a look but the bot keeps running.
    Warning,
    /// The bot (or a worker) stopped.
    Critical,
}

impl Severity {
    fn emoji(&self) -> &'static str {
        match self {
            Severity::Info => "\u{2139}\u{fe0f}",
            Severity::Warning => "\u{26a0}\u{fe0f}",
            Severity::Critical => "\u{1f6a8}",
        }
    }
}

/// Telegram alert channel. Send failures are logged and swallowed; alerting
/// never takes down trading.
#[derive(Debug, Clone)]
pub struct AlertChannel {
    http: Option<Client>,
    bot_token: String,
    chat_id: String,
}

impl AlertChannel {
    /// Channel posting to the given bot and chat.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok();
        Self {
            http,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// A channel that drops everything, for unconfigured or test setups.
    pub fn disabled() -> Self {
        Self {
            http: None,
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }

    /// Whether sends actually go anywhere.
    pub fn is_enabled(&self) -> bool {
        self.http.is_some() && !self.bot_token.is_empty()
    }

    /// Send one message. Never returns an error.
    pub async fn send(&self, severity: Severity, text: &str) {
        if !self.is_enabled() {
            debug!(?severity, text, "Alert channel disabled, dropping message");
            return;
        }
        let http = match &self.http {
            Some(c) => c,
            None => return,
        };

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": format!("{} {}", severity.emoji(), text),
        });

        match http.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                warn!(status = %response.status(), "Telegram rejected alert");
            }
            Err(e) => {
                warn!(error = %e, "Failed to send alert");
            }
        }
    }
}
