//! Media file probing.
//!
//! The compression stage needs two facts about a downloaded file: how long it
//! plays and what the audio stream's bitrate is. Both come from `ffprobe`.

mod ffprobe;
mod types;

pub use ffprobe::FfprobeProber;
pub use types::ProbeSummary;
