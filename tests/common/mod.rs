//! Shared fakes for pipeline integration tests.
//!
//! The fakes stand in for yt-dlp, ffmpeg and the chat platform so the
//! pipeline can be driven without external tools or network access.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use vidrelay::chat::{ChatTarget, Embed, MessageRef};
use vidrelay::config::LimitsConfig;
use vidrelay::pipeline::VideoPipeline;
use vidrelay_av::{
    CompressionPlan, Error, Extractor, FormatSelector, ProbeSummary, RemoteMetadata, Transcoder,
    Workspace,
};

pub const MIB: u64 = 1024 * 1024;

/// What the fake extractor does on one download call.
#[derive(Debug, Clone)]
pub enum DownloadStep {
    /// Write a file of this many bytes named `video.<ext>`.
    Write { bytes: u64, ext: &'static str },
    FormatUnavailable,
    Fail,
}

pub struct FakeExtractor {
    metadata: Mutex<Option<RemoteMetadata>>,
    steps: Mutex<VecDeque<DownloadStep>>,
    pub metadata_calls: Mutex<usize>,
    pub downloads: Mutex<Vec<FormatSelector>>,
    pub workspaces: Mutex<Vec<PathBuf>>,
}

impl FakeExtractor {
    pub fn new(metadata: Option<RemoteMetadata>, steps: Vec<DownloadStep>) -> Self {
        Self {
            metadata: Mutex::new(metadata),
            steps: Mutex::new(steps.into()),
            metadata_calls: Mutex::new(0),
            downloads: Mutex::new(Vec::new()),
            workspaces: Mutex::new(Vec::new()),
        }
    }

    /// A supported clip of the given length.
    pub fn clip(duration_secs: Option<f64>, steps: Vec<DownloadStep>) -> Self {
        Self::new(
            Some(RemoteMetadata {
                duration_secs,
                extractor: Some("youtube".into()),
                title: Some("clip".into()),
                webpage_url: None,
            }),
            steps,
        )
    }

    pub fn downloads(&self) -> Vec<FormatSelector> {
        self.downloads.lock().clone()
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn metadata(&self, _url: &Url) -> vidrelay_av::Result<RemoteMetadata> {
        *self.metadata_calls.lock() += 1;
        self.metadata
            .lock()
            .clone()
            .ok_or_else(|| Error::tool_failed("fake", "ERROR: Unable to extract"))
    }

    async fn download(
        &self,
        _url: &Url,
        format: FormatSelector,
        workspace: &Workspace,
    ) -> vidrelay_av::Result<PathBuf> {
        self.downloads.lock().push(format);
        self.workspaces.lock().push(workspace.path().to_path_buf());

        let step = self.steps.lock().pop_front().unwrap_or(DownloadStep::Fail);
        match step {
            DownloadStep::Write { bytes, ext } => {
                let path = workspace.file(&format!("video.{ext}"));
                std::fs::write(&path, vec![7u8; bytes as usize])?;
                Ok(path)
            }
            DownloadStep::FormatUnavailable => Err(Error::FormatUnavailable {
                message: "Requested format is not available".into(),
            }),
            DownloadStep::Fail => Err(Error::tool_failed("fake", "HTTP Error 403: Forbidden")),
        }
    }
}

pub struct FakeTranscoder {
    duration_secs: f64,
    audio_bitrate: Option<u64>,
    output_bytes: u64,
    fail: bool,
    pub plans: Mutex<Vec<CompressionPlan>>,
    pub passlogs: Mutex<Vec<PathBuf>>,
}

impl FakeTranscoder {
    pub fn new(duration_secs: f64, output_bytes: u64) -> Self {
        Self {
            duration_secs,
            audio_bitrate: Some(128_000),
            output_bytes,
            fail: false,
            plans: Mutex::new(Vec::new()),
            passlogs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(120.0, 0)
        }
    }

    pub fn plans(&self) -> Vec<CompressionPlan> {
        self.plans.lock().clone()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, path: &Path) -> vidrelay_av::Result<ProbeSummary> {
        Ok(ProbeSummary {
            file_path: path.to_path_buf(),
            container: "mov,mp4,m4a,3gp,3g2,mj2".into(),
            file_size: std::fs::metadata(path)?.len(),
            duration: Duration::from_secs_f64(self.duration_secs),
            video_codec: Some("h264".into()),
            audio_bitrate: self.audio_bitrate,
        })
    }

    async fn two_pass(
        &self,
        _input: &Path,
        output: &Path,
        plan: &CompressionPlan,
        passlog: &Path,
    ) -> vidrelay_av::Result<()> {
        self.plans.lock().push(plan.clone());
        self.passlogs.lock().push(passlog.to_path_buf());
        if self.fail {
            return Err(Error::tool_failed("ffmpeg", "Conversion failed!"));
        }
        std::fs::write(output, vec![1u8; self.output_bytes as usize])?;
        Ok(())
    }
}

/// Everything the pipeline did to the chat.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    SuppressEmbeds,
    Text(String),
    File { name: String, bytes: u64, first_byte: Option<u8> },
    Deleted(String),
    ReplyEmbed(Embed),
    SendEmbed(Embed),
    React(String),
}

#[derive(Default)]
pub struct RecordingChat {
    pub events: Mutex<Vec<ChatEvent>>,
    pub fail_uploads: bool,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().clone()
    }

    pub fn error_embeds(&self) -> Vec<Embed> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ChatEvent::ReplyEmbed(embed) if embed.color == vidrelay::chat::RED => Some(embed),
                _ => None,
            })
            .collect()
    }

    pub fn files(&self) -> Vec<(String, u64, Option<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ChatEvent::File {
                    name,
                    bytes,
                    first_byte,
                } => Some((name, bytes, first_byte)),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ChatEvent::Deleted(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn next(&self) -> MessageRef {
        MessageRef {
            channel_id: "chan".into(),
            message_id: self.events.lock().len().to_string(),
        }
    }
}

#[async_trait]
impl ChatTarget for RecordingChat {
    async fn suppress_embeds(&self) -> anyhow::Result<()> {
        self.events.lock().push(ChatEvent::SuppressEmbeds);
        Ok(())
    }

    async fn reply_text(&self, content: &str) -> anyhow::Result<MessageRef> {
        let reply = self.next();
        self.events.lock().push(ChatEvent::Text(content.to_string()));
        Ok(reply)
    }

    async fn replace_with_file(&self, _reply: &MessageRef, path: &Path) -> anyhow::Result<()> {
        if self.fail_uploads {
            anyhow::bail!("Discord attachment upload failed (413 Payload Too Large)");
        }
        let data = std::fs::read(path)?;
        self.events.lock().push(ChatEvent::File {
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            bytes: data.len() as u64,
            first_byte: data.first().copied(),
        });
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> anyhow::Result<()> {
        self.events
            .lock()
            .push(ChatEvent::Deleted(message.message_id.clone()));
        Ok(())
    }

    async fn reply_embed(&self, embed: &Embed) -> anyhow::Result<MessageRef> {
        let reply = self.next();
        self.events.lock().push(ChatEvent::ReplyEmbed(embed.clone()));
        Ok(reply)
    }

    async fn send_embed(&self, embed: &Embed) -> anyhow::Result<MessageRef> {
        let reply = self.next();
        self.events.lock().push(ChatEvent::SendEmbed(embed.clone()));
        Ok(reply)
    }

    async fn react(&self, _message: &MessageRef, emoji: &str) -> anyhow::Result<()> {
        self.events.lock().push(ChatEvent::React(emoji.to_string()));
        Ok(())
    }
}

/// A pipeline over fakes with a private workspace root.
pub struct Harness {
    pub extractor: Arc<FakeExtractor>,
    pub transcoder: Arc<FakeTranscoder>,
    pub pipeline: VideoPipeline,
    pub root: TempDir,
}

impl Harness {
    pub fn new(extractor: FakeExtractor, transcoder: FakeTranscoder, limits: LimitsConfig) -> Self {
        let root = tempfile::tempdir().unwrap();
        let extractor = Arc::new(extractor);
        let transcoder = Arc::new(transcoder);
        let pipeline = VideoPipeline::new(
            extractor.clone(),
            transcoder.clone(),
            limits,
            root.path().join("work"),
        );
        Self {
            extractor,
            transcoder,
            pipeline,
            root,
        }
    }

    /// Limits with a 1 MB ceiling so tests stay small.
    pub fn small_limits() -> LimitsConfig {
        LimitsConfig {
            max_upload_mb: 1,
            max_duration_secs: 300,
        }
    }

    /// Entries left under the workspace root.
    pub fn leftovers(&self) -> usize {
        match std::fs::read_dir(self.root.path().join("work")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

pub fn source() -> Url {
    Url::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap()
}
