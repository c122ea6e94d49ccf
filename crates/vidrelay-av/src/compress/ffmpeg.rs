//! Two-pass libx264 encode via the ffmpeg CLI.

use std::path::Path;

use async_trait::async_trait;

use super::{CompressionPlan, Transcoder};
use crate::probe::{FfprobeProber, ProbeSummary};
use crate::tools::ToolConfig;
use crate::{Error, Result};

#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
const NULL_DEVICE: &str = "/dev/null";

/// [`Transcoder`] backed by `ffmpeg` (encoding) and `ffprobe` (probing).
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: ToolConfig,
    prober: FfprobeProber,
}

impl Ffmpeg {
    pub fn new(ffmpeg: ToolConfig, ffprobe: ToolConfig) -> Self {
        Self {
            ffmpeg,
            prober: FfprobeProber::new(ffprobe),
        }
    }
}

/// Arguments shared by both passes: overwrite, errors-only logging, input,
/// video codec and bitrate.
fn common_args(input: &Path, plan: &CompressionPlan, pass: u8, passlog: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-b:v".to_string(),
        plan.video_bitrate_arg(),
        "-pass".to_string(),
        pass.to_string(),
        "-passlogfile".to_string(),
        passlog.to_string_lossy().to_string(),
    ]
}

/// First pass: statistics only, audio dropped, output discarded.
fn first_pass_args(input: &Path, plan: &CompressionPlan, passlog: &Path) -> Vec<String> {
    let mut args = common_args(input, plan, 1, passlog);
    args.extend(["-an", "-f", "mp4", NULL_DEVICE].map(String::from));
    args
}

/// Second pass: real output with AAC audio at the plan's fixed bitrate.
fn second_pass_args(
    input: &Path,
    output: &Path,
    plan: &CompressionPlan,
    passlog: &Path,
) -> Vec<String> {
    let mut args = common_args(input, plan, 2, passlog);
    args.extend([
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        plan.audio_bitrate_arg(),
        output.to_string_lossy().to_string(),
    ]);
    args
}

#[async_trait]
impl Transcoder for Ffmpeg {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<ProbeSummary> {
        self.prober.probe(path).await
    }

    async fn two_pass(
        &self,
        input: &Path,
        output: &Path,
        plan: &CompressionPlan,
        passlog: &Path,
    ) -> Result<()> {
        if !input.exists() {
            return Err(Error::file_not_found(input));
        }

        tracing::info!(
            "two-pass encode {:?} -> {:?} at {} bps video / {} bps audio",
            input,
            output,
            plan.video_bitrate_arg(),
            plan.audio_bitrate_bps
        );

        let mut pass1 = self.ffmpeg.command();
        pass1.args(first_pass_args(input, plan, passlog));
        pass1.execute().await?;

        let mut pass2 = self.ffmpeg.command();
        pass2.args(second_pass_args(input, output, plan, passlog));
        pass2.execute().await?;

        if !output.exists() {
            return Err(Error::tool_failed(
                "ffmpeg",
                format!("second pass produced no output at {}", output.display()),
            ));
        }

        Ok(())
    }
}
