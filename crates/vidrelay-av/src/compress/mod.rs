//! Size-targeted compression.
//!
//! A [`CompressionPlan`] turns a target file size and a source duration into
//! the bitrates for a two-pass H.264 encode; a [`Transcoder`] probes the
//! source and carries the plan out.

mod ffmpeg;

pub use ffmpeg::Ffmpeg;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::probe::ProbeSummary;
use crate::{Error, Result};

/// Audio bitrate used for every compressed output, in bits per second.
pub const AUDIO_BITRATE_BPS: u64 = 32_000;

/// Divisor applied to the duration when deriving the total bitrate.
///
/// Equal to 2^30 / 10^9; reconciles the KiB-based byte count with a decimal
/// bits-per-second rate.
pub const UNIT_RECONCILIATION: f64 = 1.073741824;

/// Bitrates for one two-pass encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionPlan {
    /// Size the output should come in under, in kilobytes.
    pub target_size_kb: u64,
    /// Source duration in seconds.
    pub duration_secs: f64,
    /// Audio bitrate the prober reported. Informational only: the encode
    /// always uses [`AUDIO_BITRATE_BPS`].
    pub probed_audio_bitrate: Option<u64>,
    /// Audio bitrate the encode uses.
    pub audio_bitrate_bps: u64,
    /// Combined audio+video budget.
    pub total_bitrate_bps: f64,
    /// Video budget: total minus audio.
    pub video_bitrate_bps: f64,
}

impl CompressionPlan {
    /// Compute the plan.
    ///
    /// `total = (target_size_kb * 1024 * 8) / (1.073741824 * duration)`,
    /// `video = total - 32000`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if the duration is not positive or the video
    /// budget would be zero or negative.
    pub fn new(
        target_size_kb: u64,
        duration_secs: f64,
        probed_audio_bitrate: Option<u64>,
    ) -> Result<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "cannot plan compression for duration {duration_secs}s"
            )));
        }

        let total_bitrate_bps =
            (target_size_kb as f64 * 1024.0 * 8.0) / (UNIT_RECONCILIATION * duration_secs);
        let audio_bitrate_bps = AUDIO_BITRATE_BPS;
        let video_bitrate_bps = total_bitrate_bps - audio_bitrate_bps as f64;

        if video_bitrate_bps <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "{target_size_kb} KB over {duration_secs:.1}s leaves no room for video \
                 (total {total_bitrate_bps:.0} bps)"
            )));
        }

        Ok(Self {
            target_size_kb,
            duration_secs,
            probed_audio_bitrate,
            audio_bitrate_bps,
            total_bitrate_bps,
            video_bitrate_bps,
        })
    }

    /// Plan from a probe of the source file.
    pub fn from_probe(target_size_kb: u64, probe: &ProbeSummary) -> Result<Self> {
        Self::new(target_size_kb, probe.duration_secs(), probe.audio_bitrate)
    }

    /// Video bitrate as passed to `-b:v` (whole bits per second).
    pub fn video_bitrate_arg(&self) -> String {
        format!("{}", self.video_bitrate_bps.floor() as u64)
    }

    /// Audio bitrate as passed to `-b:a`.
    pub fn audio_bitrate_arg(&self) -> String {
        self.audio_bitrate_bps.to_string()
    }
}

/// A backend that can probe and two-pass encode a file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Short identifier for logs (e.g. `"ffmpeg"`).
    fn name(&self) -> &'static str;

    /// Read duration and audio bitrate of `path`.
    async fn probe(&self, path: &Path) -> Result<ProbeSummary>;

    /// Encode `input` into `output` following `plan`. `passlog` is the
    /// prefix for the first pass's statistics file and must be private to
    /// the request.
    async fn two_pass(
        &self,
        input: &Path,
        output: &Path,
        plan: &CompressionPlan,
        passlog: &Path,
    ) -> Result<()>;
}
