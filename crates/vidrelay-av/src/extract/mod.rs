//! Remote media extraction.
//!
//! An [`Extractor`] resolves a source URL to metadata and downloads its
//! streams into a request [`Workspace`]. The production backend is
//! [`YtDlp`]; the trait exists so the delivery pipeline can be driven by
//! other backends (and by fakes in tests).

mod ytdlp;

pub use ytdlp::YtDlp;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Result, Workspace};

/// File stem every download is written under inside its workspace.
pub const DOWNLOAD_STEM: &str = "video";

/// Extractor key yt-dlp reports when no dedicated site handler matched.
const GENERIC_EXTRACTOR: &str = "generic";

/// Stream selection handed to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatSelector {
    /// Best video stream plus the smallest audio stream, merged to mp4.
    BestVideoWorstAudio,
    /// Best single pre-combined stream; the relaxed fallback.
    BestCombined,
}

impl FormatSelector {
    /// The yt-dlp `-f` expression.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatSelector::BestVideoWorstAudio => "bestvideo+worstaudio",
            FormatSelector::BestCombined => "best",
        }
    }
}

impl fmt::Display for FormatSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for the first item behind a source URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteMetadata {
    /// Playback length in seconds, when the extractor could determine it.
    pub duration_secs: Option<f64>,
    /// Site handler that resolved the URL (e.g. `youtube`, `generic`).
    pub extractor: Option<String>,
    pub title: Option<String>,
    pub webpage_url: Option<String>,
}

impl RemoteMetadata {
    /// Whether a dedicated site handler (anything but `generic`) resolved the
    /// URL.
    pub fn is_supported(&self) -> bool {
        self.extractor
            .as_deref()
            .is_some_and(|e| !e.eq_ignore_ascii_case(GENERIC_EXTRACTOR))
    }
}

/// A backend that can describe and download remote media.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short identifier for logs (e.g. `"yt-dlp"`).
    fn name(&self) -> &'static str;

    /// Fetch metadata for the first item behind `url`, without downloading.
    async fn metadata(&self, url: &Url) -> Result<RemoteMetadata>;

    /// Download `url` with the given selector into `workspace` and return the
    /// path of the finished file.
    ///
    /// Implementations report an unsatisfiable selector as
    /// [`crate::Error::FormatUnavailable`].
    async fn download(
        &self,
        url: &Url,
        format: FormatSelector,
        workspace: &Workspace,
    ) -> Result<PathBuf>;
}
