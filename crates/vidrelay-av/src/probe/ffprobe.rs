//! FFprobe-based media probing.

use super::types::ProbeSummary;
use crate::tools::ToolConfig;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    bit_rate: Option<String>,
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    tool: ToolConfig,
}

impl FfprobeProber {
    /// Create a prober for the given resolved ffprobe tool.
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    /// Probe a media file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, ffprobe fails, or the output carries no
    /// usable duration.
    pub async fn probe(&self, path: &Path) -> Result<ProbeSummary> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }

        let mut cmd = self.tool.command();
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute().await?;
        parse_ffprobe_json(path, &output.stdout)
    }
}

fn parse_ffprobe_json(path: &Path, json: &str) -> Result<ProbeSummary> {
    let output: FfprobeOutput = serde_json::from_str(json)?;

    let duration = output
        .format
        .duration
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| Error::parse_error("ffprobe", "format has no duration"))?;

    let video_codec = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .and_then(|s| s.codec_name.clone());

    let audio_bitrate = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .and_then(|s| s.bit_rate.as_deref())
        .and_then(|s| s.parse::<u64>().ok());

    Ok(ProbeSummary {
        file_path: path.to_path_buf(),
        container: output.format.format_name.unwrap_or_default(),
        file_size: output.format.size.and_then(|s| s.parse().ok()).unwrap_or(0),
        duration,
        video_codec,
        audio_bitrate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264", "bit_rate": "2500000"},
            {"index": 1, "codec_type": "audio", "codec_name": "opus", "bit_rate": "48000"}
        ],
        "format": {
            "filename": "video.mp4",
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": "120.500000",
            "size": "12582912"
        }
    }"#;

    #[test]
    fn parses_duration_and_audio_bitrate() {
        let info = parse_ffprobe_json(Path::new("video.mp4"), SAMPLE).unwrap();
        assert_eq!(info.duration, Duration::from_secs_f64(120.5));
        assert_eq!(info.audio_bitrate, Some(48_000));
        assert_eq!(info.file_size, 12_582_912);
        assert_eq!(info.video_codec.as_deref(), Some("h264"));
        assert!(info.container.contains("mp4"));
    }

    #[test]
    fn missing_audio_stream_leaves_bitrate_empty() {
        let json = r#"{
            "streams": [{"codec_type": "video", "codec_name": "vp9"}],
            "format": {"format_name": "webm", "duration": "10.0"}
        }"#;
        let info = parse_ffprobe_json(Path::new("clip.webm"), json).unwrap();
        assert_eq!(info.audio_bitrate, None);
        assert_eq!(info.file_size, 0);
    }

    #[test]
    fn missing_duration_is_a_parse_error() {
        let json = r#"{"streams": [], "format": {"format_name": "mp4"}}"#;
        let result = parse_ffprobe_json(Path::new("x.mp4"), json);
        assert!(matches!(result, Err(Error::ParseError { .. })));
    }

    #[test]
    fn garbage_is_a_json_error() {
        let result = parse_ffprobe_json(Path::new("x.mp4"), "not json");
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
