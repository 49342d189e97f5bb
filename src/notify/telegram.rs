use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::NotificationChannel;
use crate::config::{ConfigError, NotificationConfig};
use crate::error::HunterError;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram Bot API channel.
pub struct TelegramChannel {
    client: Client,
    bot_url: SecretString,
    chat_id: String,
    parse_mode: Option<String>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Deserialize)]
struct GetMeResponse {
    ok: bool,
    result: Option<BotUser>,
}

#[derive(Deserialize)]
struct BotUser {
    username: Option<String>,
}

impl TelegramChannel {
    pub fn new(
        api_base: &str,
        bot_token: &SecretString,
        chat_id: impl Into<String>,
        parse_mode: Option<String>,
    ) -> Result<Self, HunterError> {
        Ok(Self::with_client(
            Client::builder().build()?,
            api_base,
            bot_token,
            chat_id,
            parse_mode,
        ))
    }

    /// Creates a channel around an existing HTTP client.
    pub fn with_client(
        client: Client,
        api_base: &str,
        bot_token: &SecretString,
        chat_id: impl Into<String>,
        parse_mode: Option<String>,
    ) -> Self {
        let bot_url = format!(
            "{}/bot{}",
            api_base.trim_end_matches('/'),
            bot_token.expose_secret()
        );
        log::info!("telegram channel initialized");
        Self {
            client,
            bot_url: SecretString::new(bot_url),
            chat_id: chat_id.into(),
            parse_mode: parse_mode.filter(|mode| !mode.is_empty()),
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Result<Self, HunterError> {
        let token = config.bot_token.as_ref().ok_or_else(|| {
            ConfigError::Missing(vec!["notification.bot_token".to_string()])
        })?;
        let chat_id = config
            .chat_id
            .clone()
            .ok_or_else(|| ConfigError::Missing(vec!["notification.chat_id".to_string()]))?;
        Self::new(
            &config.api_base,
            token,
            chat_id,
            Some(config.parse_mode.clone()),
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.bot_url.expose_secret())
    }

    async fn post_message(&self, text: &str) -> Result<(), HunterError> {
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: self.parse_mode.as_deref(),
        };
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| HunterError::Notification(e.without_url().to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(HunterError::Notification(format!(
                "telegram returned {status}: {detail}"
            )));
        }
        Ok(())
    }

    async fn get_me(&self) -> Result<GetMeResponse, HunterError> {
        let resp = self
            .client
            .get(self.method_url("getMe"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| HunterError::Notification(e.without_url().to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HunterError::Notification(format!(
                "telegram returned {status}"
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| HunterError::Notification(e.without_url().to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send_message(&self, text: &str) -> bool {
        match self.post_message(text).await {
            Ok(()) => {
                log::debug!("message sent");
                true
            }
            Err(err) => {
                log::error!("failed to send message: {err}");
                false
            }
        }
    }

    async fn test_connection(&self) -> bool {
        match self.get_me().await {
            Ok(GetMeResponse { ok: true, result }) => {
                let username = result
                    .and_then(|user| user.username)
                    .unwrap_or_else(|| "unknown".to_string());
                log::info!("bot connection test successful: @{username}");
                true
            }
            Ok(_) => {
                log::error!("bot connection test failed");
                false
            }
            Err(err) => {
                log::error!("bot connection test error: {err}");
                false
            }
        }
    }
}
