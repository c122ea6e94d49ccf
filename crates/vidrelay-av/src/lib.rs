//! # vidrelay-av
//!
//! External tool layer for the vidrelay delivery pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find yt-dlp, ffmpeg and ffprobe
//!   and attach per-tool timeouts.
//! - **Command execution** ([`ToolCommand`]) -- async builder that runs a
//!   subprocess without blocking the runtime and kills it on timeout.
//! - **Workspaces** ([`Workspace`]) -- per-request scratch directories that
//!   disappear on drop.
//! - **Extraction** ([`extract`]) -- the [`Extractor`] trait and its yt-dlp
//!   backend.
//! - **Probing** ([`probe`]) -- duration and audio bitrate through ffprobe.
//! - **Compression** ([`compress`]) -- bitrate planning for a target size and
//!   the [`Transcoder`] trait with its two-pass ffmpeg backend.

mod error;

pub mod command;
pub mod compress;
pub mod extract;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use compress::{CompressionPlan, Ffmpeg, Transcoder, AUDIO_BITRATE_BPS};
pub use error::{Error, Result};
pub use extract::{Extractor, FormatSelector, RemoteMetadata, YtDlp, DOWNLOAD_STEM};
pub use probe::{FfprobeProber, ProbeSummary};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry, ToolsConfig};
pub use workspace::Workspace;
