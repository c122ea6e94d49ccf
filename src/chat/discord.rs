use super::{ChatTarget, Embed, MessageRef};
use crate::config::DiscordConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// Message flag that hides link previews.
const SUPPRESS_EMBEDS: u64 = 1 << 2;

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
    channel_id: String,
}

/// Discord REST client authenticated as a bot.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    api_base: String,
    token: String,
}

impl DiscordClient {
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .context("discord.token is not set (or set VIDRELAY_DISCORD_TOKEN)")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("vidrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Bind the client to the message that triggered a request.
    pub fn message(
        &self,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> DiscordMessage {
        DiscordMessage {
            client: self.clone(),
            target: MessageRef {
                channel_id: channel_id.into(),
                message_id: message_id.into(),
            },
        }
    }

    fn message_url(&self, channel_id: &str, message_id: Option<&str>) -> String {
        match message_id {
            Some(id) => format!("{}/channels/{}/messages/{}", self.api_base, channel_id, id),
            None => format!("{}/channels/{}/messages", self.api_base, channel_id),
        }
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn create_message(
        &self,
        channel_id: &str,
        body: serde_json::Value,
        action: &str,
    ) -> Result<MessageRef> {
        let response = self
            .client
            .post(self.message_url(channel_id, None))
            .header(AUTHORIZATION, self.auth())
            .json(&body)
            .send()
            .await?;

        let created: CreatedMessage = check(response, action).await?.json().await?;
        Ok(MessageRef {
            channel_id: created.channel_id,
            message_id: created.id,
        })
    }
}

async fn check(response: Response, action: &str) -> Result<Response> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Discord {} failed ({}): {}", action, status, body);
    }
    Ok(response)
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// A [`DiscordClient`] bound to one triggering message.
#[derive(Clone)]
pub struct DiscordMessage {
    client: DiscordClient,
    target: MessageRef,
}

impl DiscordMessage {
    pub fn target(&self) -> &MessageRef {
        &self.target
    }

    fn reference(&self) -> serde_json::Value {
        json!({
            "message_id": self.target.message_id,
            "fail_if_not_exists": false,
        })
    }
}

#[async_trait]
impl ChatTarget for DiscordMessage {
    async fn suppress_embeds(&self) -> Result<()> {
        let url = self
            .client
            .message_url(&self.target.channel_id, Some(&self.target.message_id));

        let response = self
            .client
            .client
            .patch(&url)
            .header(AUTHORIZATION, self.client.auth())
            .json(&json!({ "flags": SUPPRESS_EMBEDS }))
            .send()
            .await?;

        check(response, "suppress embeds").await?;
        Ok(())
    }

    async fn reply_text(&self, content: &str) -> Result<MessageRef> {
        let body = json!({
            "content": content,
            "message_reference": self.reference(),
        });
        self.client
            .create_message(&self.target.channel_id, body, "reply")
            .await
    }

    async fn replace_with_file(&self, reply: &MessageRef, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read attachment {:?}", path))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());

        tracing::debug!(
            "uploading {} ({} bytes) to message {}",
            file_name,
            bytes.len(),
            reply.message_id
        );

        let payload = json!({
            "content": null,
            "attachments": [{ "id": 0, "filename": file_name }],
        });
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(path))?;
        let form = Form::new()
            .text("payload_json", payload.to_string())
            .part("files[0]", part);

        let response = self
            .client
            .client
            .patch(
                self.client
                    .message_url(&reply.channel_id, Some(&reply.message_id)),
            )
            .header(AUTHORIZATION, self.client.auth())
            .multipart(form)
            .send()
            .await?;

        check(response, "attachment upload").await?;
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<()> {
        let response = self
            .client
            .client
            .delete(
                self.client
                    .message_url(&message.channel_id, Some(&message.message_id)),
            )
            .header(AUTHORIZATION, self.client.auth())
            .send()
            .await?;

        check(response, "delete").await?;
        Ok(())
    }

    async fn reply_embed(&self, embed: &Embed) -> Result<MessageRef> {
        let body = json!({
            "embeds": [embed],
            "message_reference": self.reference(),
        });
        self.client
            .create_message(&self.target.channel_id, body, "embed reply")
            .await
    }

    async fn send_embed(&self, embed: &Embed) -> Result<MessageRef> {
        self.client
            .create_message(&self.target.channel_id, json!({ "embeds": [embed] }), "embed")
            .await
    }

    async fn react(&self, message: &MessageRef, emoji: &str) -> Result<()> {
        let encoded: String = url::form_urlencoded::byte_serialize(emoji.as_bytes()).collect();
        let url = format!(
            "{}/reactions/{}/@me",
            self.client
                .message_url(&message.channel_id, Some(&message.message_id)),
            encoded
        );

        let response = self
            .client
            .client
            .put(&url)
            .header(AUTHORIZATION, self.client.auth())
            .header(CONTENT_LENGTH, 0)
            .send()
            .await?;

        check(response, "reaction").await?;
        Ok(())
    }
}
