use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::NotifyError;

/// Delivery channel for alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(http: Client, bot_token: String, chat_id: String) -> Self {
        Self {
            http,
            bot_token,
            chat_id,
        }
    }

    fn has_credentials(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        if !self.has_credentials() {
            return Err(NotifyError::Delivery(
                "TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID are missing in .env".to_string(),
            ));
        }

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "HTML",
        });

        let res = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery(format!(
                "sendMessage failed: {status} {body}"
            )));
        }

        Ok(())
    }
}
