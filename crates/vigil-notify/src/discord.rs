//! Discord webhook transport.
//!
//! Messages are posted with `?wait=true` so the webhook returns the created
//! message, whose id becomes the edit handle for later rounds.

#[cfg(test)]
#[path = "discord_tests.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use vigil_config::DiscordChannelConfig;
use vigil_protocols::{AlertLevel, MessageHandle, NotificationContent, NotifyError, StatusNotifier};

const DISCORD_API_BASE: &str = "https://discord.com/api/webhooks";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Discord webhook settings.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Webhook id.
    pub webhook_id: String,
    /// Webhook token.
    pub webhook_token: String,
    /// Username override for posted messages.
    pub username: Option<String>,
    /// API base, overridable for tests.
    pub api_base: String,
}

impl DiscordConfig {
    /// Build from the persisted channel configuration.
    pub fn from_channel(channel: &DiscordChannelConfig) -> Self {
        Self {
            webhook_id: channel.webhook.id.clone(),
            webhook_token: channel.webhook.token.clone(),
            username: channel.username.clone(),
            api_base: DISCORD_API_BASE.to_string(),
        }
    }
}

/// Webhook-based status notifier.
pub struct DiscordNotifier {
    config: DiscordConfig,
    client: reqwest::Client,
}

impl DiscordNotifier {
    /// Create a notifier for the given webhook.
    pub fn new(config: DiscordConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn webhook_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.webhook_id,
            self.config.webhook_token
        )
    }

    fn payload(&self, content: &NotificationContent) -> serde_json::Value {
        let mut payload = json!({
            "embeds": [{
                "title": format!("{} {}", content.level.emoji(), content.title),
                "description": content.body,
                "color": content.level.color(),
            }]
        });

        if let Some(username) = &self.config.username {
            payload["username"] = json!(username);
        }

        if content.level >= AlertLevel::High && !content.mention_user_ids.is_empty() {
            let mentions: Vec<String> = content
                .mention_user_ids
                .iter()
                .map(|id| format!("<@{id}>"))
                .collect();
            payload["content"] = json!(mentions.join(" "));
        }

        payload
    }
}

#[async_trait]
impl StatusNotifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, content: &NotificationContent) -> Result<MessageHandle, NotifyError> {
        let url = format!("{}?wait=true", self.webhook_url());

        let response = self
            .client
            .post(&url)
            .json(&self.payload(content))
            .send()
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedMessage = response
            .json()
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        debug!(message_id = %created.id, "discord status message created");
        Ok(created.id)
    }

    async fn edit(
        &self,
        handle: &MessageHandle,
        content: &NotificationContent,
    ) -> Result<(), NotifyError> {
        let url = format!("{}/messages/{handle}", self.webhook_url());

        let response = self
            .client
            .patch(&url)
            .json(&self.payload(content))
            .send()
            .await
            .map_err(|e| NotifyError::Edit(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(NotifyError::MessageNotFound(handle.clone()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!(message_id = %handle, "discord status message edited");
        Ok(())
    }
}

#[derive(Deserialize)]
struct CreatedMessage {
    id: String,
}
