use crate::config::LimitsConfig;
use std::fmt;

/// Why a request was turned away before anything was downloaded.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The extractor could not describe the source.
    MetadataUnavailable(String),
    /// Only the generic handler matched the source.
    Unsupported,
    /// The source has no known duration.
    UnknownDuration,
    TooLong { duration_secs: f64, max_secs: u64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MetadataUnavailable(e) => write!(f, "metadata unavailable: {}", e),
            Rejection::Unsupported => write!(f, "unsupported site"),
            Rejection::UnknownDuration => write!(f, "unknown duration"),
            Rejection::TooLong {
                duration_secs,
                max_secs,
            } => write!(f, "duration {:.1}s exceeds {}s", duration_secs, max_secs),
        }
    }
}

/// Stage at which an accepted request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Compress,
    Send,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Download => "download",
            Stage::Compress => "compress",
            Stage::Send => "send",
        };
        f.write_str(name)
    }
}

/// The file that was posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub file_name: String,
    pub bytes: u64,
    pub compressed: bool,
}

/// Terminal state of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Rejected(Rejection),
    Failed { stage: Stage, message: String },
    Delivered(Delivery),
}

impl PipelineOutcome {
    pub(crate) fn failed(stage: Stage, message: impl Into<String>) -> Self {
        PipelineOutcome::Failed {
            stage,
            message: message.into(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, PipelineOutcome::Delivered(_))
    }

    /// Title of the error embed for this outcome, if it warrants one.
    pub fn notice(&self, limits: &LimitsConfig) -> Option<String> {
        let text = match self {
            PipelineOutcome::Delivered(_) => return None,
            PipelineOutcome::Rejected(Rejection::TooLong { .. })
            | PipelineOutcome::Rejected(Rejection::UnknownDuration) => format!(
                "Video requested is longer than {} seconds",
                limits.max_duration_secs
            ),
            PipelineOutcome::Rejected(Rejection::Unsupported) => {
                "This site is not supported".to_string()
            }
            PipelineOutcome::Rejected(Rejection::MetadataUnavailable(_)) => {
                "Could not read video information".to_string()
            }
            PipelineOutcome::Failed {
                stage: Stage::Download,
                ..
            } => "Video could not be downloaded".to_string(),
            PipelineOutcome::Failed {
                stage: Stage::Compress,
                ..
            } => format!(
                "Video could not be compressed under {} MB",
                limits.max_upload_mb
            ),
            PipelineOutcome::Failed {
                stage: Stage::Send, ..
            } => "Video could not be sent".to_string(),
        };
        Some(text)
    }
}

impl fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineOutcome::Rejected(reason) => write!(f, "rejected: {}", reason),
            PipelineOutcome::Failed { stage, message } => {
                write!(f, "failed at {}: {}", stage, message)
            }
            PipelineOutcome::Delivered(d) => write!(
                f,
                "delivered {} ({} bytes{})",
                d.file_name,
                d.bytes,
                if d.compressed { ", compressed" } else { "" }
            ),
        }
    }
}
