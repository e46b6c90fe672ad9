//! Telegram bot notification channel.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::credentials::{keys, CredentialStore};

use super::{LoginReport, Notifier};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Notifier posting to the Telegram bot API.
pub struct TelegramNotifier {
    base_url: String,
    bot_token: SecretString,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier.
    pub fn new(bot_token: SecretString, chat_id: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: TELEGRAM_API.to_string(),
            bot_token,
            chat_id,
            client,
        })
    }

    /// Point the notifier at a different API host (for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a notifier from stored credentials.
    ///
    /// Returns `Ok(None)` when the bot token or chat id is not configured,
    /// so the caller can skip notification rather than fail.
    pub async fn from_store(
        store: &dyn CredentialStore,
        timeout: Duration,
    ) -> Result<Option<Self>> {
        let token = store.get(keys::TELEGRAM_BOT_TOKEN).await?;
        let chat_id = store.get(keys::TELEGRAM_CHAT_ID).await?;

        match (token, chat_id) {
            (Some(token), Some(chat_id)) => Ok(Some(Self::new(
                token,
                chat_id.expose_secret().to_string(),
                timeout,
            )?)),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, report: &LoginReport) -> Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url,
            self.bot_token.expose_secret()
        );

        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": report.render(),
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Telegram request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Telegram sendMessage returned {status}: {}",
                &body[..body.len().min(500)]
            );
        }

        debug!("Telegram notification sent");
        Ok(())
    }
}
