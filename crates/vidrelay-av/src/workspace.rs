//! Per-request scratch storage.
//!
//! Every delivery request gets its own [`Workspace`]: a uniquely named
//! directory under a configurable root that holds the download, the
//! compressed output and the two-pass log. The directory is removed when the
//! workspace is dropped, so concurrent requests never share files and no
//! residue survives a request, whichever way it ends.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Error, Result};

/// Prefix for request directories created under the workspace root.
const DIR_PREFIX: &str = "request-";

/// Suffixes yt-dlp leaves behind for partial or intermediate downloads.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

/// Scoped scratch directory for one request.
///
/// # Example
///
/// ```no_run
/// use vidrelay_av::Workspace;
///
/// let workspace = Workspace::create(std::env::temp_dir().join("vidrelay"))?;
/// let target = workspace.file("video_compressed.mp4");
/// // ... write into `target` ...
/// drop(workspace); // directory and contents are gone
/// # Ok::<(), vidrelay_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a fresh request directory under `root`, creating `root` first if
    /// it does not exist.
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| {
            Error::Workspace(format!("failed to create root {}: {e}", root.display()))
        })?;

        let temp_dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(root)
            .map_err(|e| Error::Workspace(format!("failed to create temp dir: {e}")))?;

        tracing::debug!("workspace created at {}", temp_dir.path().display());

        Ok(Self { temp_dir })
    }

    /// Path to the request directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Locate the finished download named `<stem>.<ext>`.
    ///
    /// The extension is decided by the extractor (merged downloads are mp4,
    /// single-stream fallbacks may be anything), so the directory is scanned.
    /// Partial-download leftovers are ignored.
    pub async fn find_download(&self, stem: &str) -> Result<PathBuf> {
        let prefix = format!("{stem}.");
        let mut candidates = Vec::new();

        let mut entries = tokio::fs::read_dir(self.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(&prefix) {
                continue;
            }
            if PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                continue;
            }
            candidates.push(entry.path());
        }

        // Deterministic pick if the extractor left more than one candidate.
        candidates.sort();
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::file_not_found(self.file(&format!("{stem}.*"))))
    }

    /// Remove the workspace now on the blocking pool, reporting failures
    /// instead of swallowing them the way drop does.
    pub async fn cleanup(self) -> Result<()> {
        let path = self.path().to_path_buf();
        let temp_dir = self.temp_dir;

        tokio::task::spawn_blocking(move || temp_dir.close())
            .await
            .map_err(|e| Error::Workspace(format!("cleanup task failed: {e}")))?
            .map_err(|e| Error::Workspace(format!("failed to remove {}: {e}", path.display())))
    }
}
