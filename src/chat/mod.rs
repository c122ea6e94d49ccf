//! Chat platform collaborator.
//!
//! The delivery pipeline talks to chat through [`ChatTarget`], a handle bound
//! to the one incoming message that triggered the request. [`DiscordClient`]
//! provides the production implementation over the Discord REST API and
//! [`DirectorySink`] a local one for the CLI.

mod discord;
mod embed;
mod inspect;
mod local;

pub use discord::{DiscordClient, DiscordMessage};
pub use embed::{Embed, EmbedFooter, EmbedImage, BLUE, RED};
pub use inspect::{emoji_codes, is_facebook_video, is_gif_url, parse_source, SourceError};
pub use local::DirectorySink;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Text of the placeholder reply posted while a video is being prepared.
pub const WAIT_MESSAGE: &str = "Please wait a moment...";

/// A message on the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

/// Operations available against the message that triggered a request.
#[async_trait]
pub trait ChatTarget: Send + Sync {
    /// Hide the link preview on the triggering message.
    async fn suppress_embeds(&self) -> Result<()>;

    /// Reply to the triggering message with plain text.
    async fn reply_text(&self, content: &str) -> Result<MessageRef>;

    /// Edit `reply` so its text is cleared and `path` is attached.
    async fn replace_with_file(&self, reply: &MessageRef, path: &Path) -> Result<()>;

    /// Delete a message the bot posted.
    async fn delete_message(&self, message: &MessageRef) -> Result<()>;

    /// Reply to the triggering message with an embed.
    async fn reply_embed(&self, embed: &Embed) -> Result<MessageRef>;

    /// Post an embed to the channel without replying.
    async fn send_embed(&self, embed: &Embed) -> Result<MessageRef>;

    /// Add a reaction to `message`.
    async fn react(&self, message: &MessageRef, emoji: &str) -> Result<()>;
}

/// Post `embed` as a reply (or a plain channel message when `reply` is
/// false), then add each reaction in order.
pub async fn embed_message(
    chat: &dyn ChatTarget,
    embed: &Embed,
    reply: bool,
    reactions: &[&str],
) -> Result<MessageRef> {
    let message = if reply {
        chat.reply_embed(embed).await?
    } else {
        chat.send_embed(embed).await?
    };

    for reaction in reactions {
        chat.react(&message, reaction).await?;
    }

    Ok(message)
}

/// Reply with a red embed titled `content`.
pub async fn error_embed(chat: &dyn ChatTarget, content: &str) -> Result<MessageRef> {
    embed_message(chat, &Embed::new(RED).title(content), true, &[]).await
}
