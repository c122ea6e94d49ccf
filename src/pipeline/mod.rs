//! Video delivery pipeline.
//!
//! One call to [`VideoPipeline::deliver`] takes a source URL from a chat
//! message to a posted file:
//!
//! 1. duration gate against the extractor's metadata,
//! 2. download into a private [`Workspace`], falling back to a combined
//!    stream once when the preferred formats are unavailable,
//! 3. size gate, compressing once with a two-pass encode when the download
//!    is above the upload ceiling,
//! 4. replace the placeholder reply with the file, or remove the
//!    placeholder when the request fails after posting it.
//!
//! Every exit path ends in a [`PipelineOutcome`]; nothing propagates to the
//! caller.

mod outcome;

pub use outcome::{Delivery, PipelineOutcome, Rejection, Stage};

use crate::chat::{error_embed, ChatTarget, MessageRef, WAIT_MESSAGE};
use crate::config::{Config, LimitsConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;
use vidrelay_av::tools::{FFMPEG, FFPROBE, YTDLP};
use vidrelay_av::{
    CompressionPlan, Extractor, Ffmpeg, FormatSelector, ToolRegistry, Transcoder, Workspace,
    YtDlp,
};

/// Name of the compressed output inside a workspace.
pub const COMPRESSED_FILE: &str = "video_compressed.mp4";

/// Prefix for the first pass's statistics files inside a workspace.
const PASSLOG_PREFIX: &str = "ffmpeg2pass";

pub struct VideoPipeline {
    extractor: Arc<dyn Extractor>,
    transcoder: Arc<dyn Transcoder>,
    limits: LimitsConfig,
    workspace_root: PathBuf,
}

impl VideoPipeline {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        transcoder: Arc<dyn Transcoder>,
        limits: LimitsConfig,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            transcoder,
            limits,
            workspace_root: workspace_root.into(),
        }
    }

    /// Build the production pipeline: yt-dlp and ffmpeg as discovered on
    /// this host.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = ToolRegistry::discover(&config.tools);
        let ytdlp = registry.require(YTDLP)?.clone();
        let ffmpeg = registry.require(FFMPEG)?.clone();
        let ffprobe = registry.require(FFPROBE)?.clone();

        Ok(Self::new(
            Arc::new(YtDlp::new(ytdlp, config.tools.probe_timeout())),
            Arc::new(Ffmpeg::new(ffmpeg, ffprobe)),
            config.limits,
            config.workspace.root.clone(),
        ))
    }

    /// Run one request against `chat`.
    ///
    /// With `notify` set, every rejection or failure is answered with a red
    /// error embed; without it, they are only logged.
    pub async fn deliver(&self, chat: &dyn ChatTarget, url: &Url, notify: bool) -> PipelineOutcome {
        let outcome = self.run(chat, url).await;

        match &outcome {
            PipelineOutcome::Delivered(_) => tracing::info!("{}: {}", url, outcome),
            PipelineOutcome::Rejected(_) => tracing::info!("{}: {}", url, outcome),
            PipelineOutcome::Failed { .. } => tracing::error!("{}: {}", url, outcome),
        }

        if notify {
            if let Some(notice) = outcome.notice(&self.limits) {
                if let Err(e) = error_embed(chat, &notice).await {
                    tracing::warn!("Failed to post error notice: {:#}", e);
                }
            }
        }

        outcome
    }

    async fn run(&self, chat: &dyn ChatTarget, url: &Url) -> PipelineOutcome {
        if let Err(e) = chat.suppress_embeds().await {
            tracing::warn!("Failed to suppress embeds: {:#}", e);
        }

        if let Err(rejection) = self.check_duration(url).await {
            return PipelineOutcome::Rejected(rejection);
        }

        let root = self.workspace_root.clone();
        let workspace = match tokio::task::spawn_blocking(move || Workspace::create(root)).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => return PipelineOutcome::failed(Stage::Download, e.to_string()),
            Err(e) => return PipelineOutcome::failed(Stage::Download, e.to_string()),
        };

        let outcome = self.fetch_and_send(chat, url, &workspace).await;

        if let Err(e) = workspace.cleanup().await {
            tracing::warn!("{}", e);
        }

        outcome
    }

    async fn check_duration(&self, url: &Url) -> std::result::Result<(), Rejection> {
        let metadata = self
            .extractor
            .metadata(url)
            .await
            .map_err(|e| Rejection::MetadataUnavailable(e.to_string()))?;

        if !metadata.is_supported() {
            return Err(Rejection::Unsupported);
        }

        let duration_secs = metadata.duration_secs.ok_or(Rejection::UnknownDuration)?;
        if !self.limits.allows_duration(duration_secs) {
            return Err(Rejection::TooLong {
                duration_secs,
                max_secs: self.limits.max_duration_secs,
            });
        }

        tracing::debug!("{} is {:.1}s long", url, duration_secs);
        Ok(())
    }

    async fn fetch_and_send(
        &self,
        chat: &dyn ChatTarget,
        url: &Url,
        workspace: &Workspace,
    ) -> PipelineOutcome {
        let source = match self.retrieve(url, workspace).await {
            Ok(path) => path,
            Err(e) => return PipelineOutcome::failed(Stage::Download, e.to_string()),
        };

        let reply = match chat.reply_text(WAIT_MESSAGE).await {
            Ok(reply) => reply,
            Err(e) => return PipelineOutcome::failed(Stage::Send, format!("{:#}", e)),
        };

        let outcome = self.attach(chat, &reply, source, workspace).await;

        if !outcome.is_delivered() {
            if let Err(e) = chat.delete_message(&reply).await {
                tracing::warn!("Failed to remove placeholder reply: {:#}", e);
            }
        }

        outcome
    }

    /// Size gate, optional compression, then swap the placeholder `reply`
    /// for the file.
    async fn attach(
        &self,
        chat: &dyn ChatTarget,
        reply: &MessageRef,
        source: PathBuf,
        workspace: &Workspace,
    ) -> PipelineOutcome {
        let size = match file_size(&source).await {
            Ok(size) => size,
            Err(e) => return PipelineOutcome::failed(Stage::Download, format!("{:#}", e)),
        };

        let (file, bytes, compressed) = if self.limits.fits(size) {
            (source, size, false)
        } else {
            tracing::info!(
                "{} bytes exceeds the {} byte ceiling, compressing",
                size,
                self.limits.upload_ceiling_bytes()
            );
            match self.compress(&source, workspace).await {
                Ok((path, bytes)) => (path, bytes, true),
                Err(e) => return PipelineOutcome::failed(Stage::Compress, format!("{:#}", e)),
            }
        };

        if let Err(e) = chat.replace_with_file(reply, &file).await {
            return PipelineOutcome::failed(Stage::Send, format!("{:#}", e));
        }

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        PipelineOutcome::Delivered(Delivery {
            file_name,
            bytes,
            compressed,
        })
    }

    /// Download with the preferred selector, retrying exactly once with the
    /// combined stream when the preferred formats do not exist.
    async fn retrieve(&self, url: &Url, workspace: &Workspace) -> vidrelay_av::Result<PathBuf> {
        let first = self
            .extractor
            .download(url, FormatSelector::BestVideoWorstAudio, workspace)
            .await;

        match first {
            Err(e) if e.is_format_unavailable() => {
                tracing::info!(
                    "{} via {}: {}, retrying with '{}'",
                    url,
                    self.extractor.name(),
                    e,
                    FormatSelector::BestCombined
                );
                self.extractor
                    .download(url, FormatSelector::BestCombined, workspace)
                    .await
            }
            other => other,
        }
    }

    async fn compress(&self, source: &Path, workspace: &Workspace) -> Result<(PathBuf, u64)> {
        let probe = self
            .transcoder
            .probe(source)
            .await
            .context("Failed to probe download")?;

        let plan = CompressionPlan::from_probe(self.limits.target_size_kb(), &probe)?;
        tracing::info!(
            "Compressing {:.1}s to {} KB: video {} bps, audio {} bps (source audio {:?})",
            plan.duration_secs,
            plan.target_size_kb,
            plan.video_bitrate_arg(),
            plan.audio_bitrate_arg(),
            plan.probed_audio_bitrate
        );

        let output = workspace.file(COMPRESSED_FILE);
        self.transcoder
            .two_pass(source, &output, &plan, &workspace.file(PASSLOG_PREFIX))
            .await
            .with_context(|| format!("{} two-pass encode failed", self.transcoder.name()))?;

        let size = file_size(&output).await?;
        if !self.limits.fits(size) {
            anyhow::bail!(
                "compressed output is {} bytes, still above the {} byte ceiling",
                size,
                self.limits.upload_ceiling_bytes()
            );
        }

        Ok((output, size))
    }
}

async fn file_size(path: &Path) -> Result<u64> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat {:?}", path))?;
    Ok(metadata.len())
}
