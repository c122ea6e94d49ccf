//! Rich embed payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default embed colour.
pub const BLUE: u32 = 0x3498db;
/// Colour for errors and rejections.
pub const RED: u32 = 0xe74c3c;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// A chat embed, serialized in the shape the Discord API expects.
///
/// ```
/// use vidrelay::chat::{Embed, RED};
///
/// let embed = Embed::new(RED)
///     .title("Video requested is longer than 300 seconds")
///     .footer("vidrelay");
/// assert_eq!(embed.color, RED);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub color: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

impl Default for Embed {
    fn default() -> Self {
        Self::new(BLUE)
    }
}

impl Embed {
    pub fn new(color: u32) -> Self {
        Self {
            color,
            title: None,
            description: None,
            url: None,
            timestamp: None,
            image: None,
            footer: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(EmbedImage { url: url.into() });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}
