use super::{ChatTarget, Embed, MessageRef};
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const LOCAL_CHANNEL: &str = "local";

/// A [`ChatTarget`] that writes delivered files into a directory and prints
/// messages to stdout. Used by `vidrelay fetch`.
pub struct DirectorySink {
    out_dir: PathBuf,
    next_id: AtomicU64,
    delivered: Mutex<Vec<PathBuf>>,
}

impl DirectorySink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            next_id: AtomicU64::new(1),
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// Files written so far.
    pub fn delivered(&self) -> Vec<PathBuf> {
        self.delivered.lock().clone()
    }

    fn next_message(&self) -> MessageRef {
        MessageRef {
            channel_id: LOCAL_CHANNEL.to_string(),
            message_id: self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
        }
    }

    fn print_embed(embed: &Embed) {
        let title = embed.title.as_deref().unwrap_or_default();
        match &embed.description {
            Some(description) => println!("[{:06x}] {}: {}", embed.color, title, description),
            None => println!("[{:06x}] {}", embed.color, title),
        }
    }
}

#[async_trait]
impl ChatTarget for DirectorySink {
    async fn suppress_embeds(&self) -> Result<()> {
        Ok(())
    }

    async fn reply_text(&self, content: &str) -> Result<MessageRef> {
        println!("{}", content);
        Ok(self.next_message())
    }

    async fn replace_with_file(&self, _reply: &MessageRef, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .with_context(|| format!("Attachment has no file name: {:?}", path))?;

        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("Failed to create {:?}", self.out_dir))?;

        let dest = self.out_dir.join(file_name);
        tokio::fs::copy(path, &dest)
            .await
            .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;

        tracing::info!("Wrote {:?}", dest);
        self.delivered.lock().push(dest);
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<()> {
        tracing::debug!("Discarding local message {}", message.message_id);
        Ok(())
    }

    async fn reply_embed(&self, embed: &Embed) -> Result<MessageRef> {
        Self::print_embed(embed);
        Ok(self.next_message())
    }

    async fn send_embed(&self, embed: &Embed) -> Result<MessageRef> {
        Self::print_embed(embed);
        Ok(self.next_message())
    }

    async fn react(&self, message: &MessageRef, emoji: &str) -> Result<()> {
        println!("({} reacted {})", message.message_id, emoji);
        Ok(())
    }
}
