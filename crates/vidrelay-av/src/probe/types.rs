use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What the compression stage needs to know about a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSummary {
    /// Path of the probed file.
    pub file_path: PathBuf,
    /// Container format name as reported by the prober (e.g. `mov,mp4,m4a,3gp`).
    pub container: String,
    /// File size in bytes (0 if the prober did not report it).
    pub file_size: u64,
    /// Playback duration.
    pub duration: Duration,
    /// Codec of the first video stream, if any.
    pub video_codec: Option<String>,
    /// Bitrate of the first audio stream in bits per second, if reported.
    pub audio_bitrate: Option<u64>,
}

impl ProbeSummary {
    /// Duration in fractional seconds, the unit the bitrate formula uses.
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}
