use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use vidrelay_av::ToolsConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Gate thresholds for the delivery pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Platform upload ceiling in megabytes (default: 8)
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    /// Longest clip the bot will fetch, in seconds (default: 300)
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

fn default_max_upload_mb() -> u64 {
    8
}

fn default_max_duration_secs() -> u64 {
    300
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: default_max_upload_mb(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

impl LimitsConfig {
    /// Size gate threshold: the ceiling in binary megabytes.
    pub fn upload_ceiling_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// Compression target in kilobytes: `mb * 1000`, which lands a little
    /// under the binary ceiling.
    pub fn target_size_kb(&self) -> u64 {
        self.max_upload_mb * 1000
    }

    /// Whether a file of `size` bytes can be uploaded as-is.
    pub fn fits(&self, size: u64) -> bool {
        size <= self.upload_ceiling_bytes()
    }

    /// Whether a clip of the given length may be fetched.
    pub fn allows_duration(&self, duration_secs: f64) -> bool {
        duration_secs <= self.max_duration_secs as f64
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Directory under which per-request scratch directories are created
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("vidrelay")
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    /// Bot token (overridden by VIDRELAY_DISCORD_TOKEN)
    #[serde(default)]
    pub token: Option<String>,

    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// HTTP timeout for API calls, in seconds. Uploads can be slow.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotifyConfig {
    /// Reply with an error embed when a request is rejected or fails
    #[serde(default)]
    pub errors: bool,
}
