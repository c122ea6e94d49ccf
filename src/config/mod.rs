mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable that overrides `discord.token`.
pub const TOKEN_ENV: &str = "VIDRELAY_DISCORD_TOKEN";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./vidrelay.toml",
        "~/.config/vidrelay/config.toml",
        "/etc/vidrelay/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            config.discord.token = Some(token.trim().to_string());
        }
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.limits.max_upload_mb == 0 {
        anyhow::bail!("limits.max_upload_mb cannot be 0");
    }

    if config.limits.max_duration_secs == 0 {
        anyhow::bail!("limits.max_duration_secs cannot be 0");
    }

    let tools = &config.tools;
    if tools.download_timeout_secs == 0
        || tools.transcode_timeout_secs == 0
        || tools.probe_timeout_secs == 0
    {
        anyhow::bail!("tool timeouts must be greater than 0");
    }

    if !config.discord.api_base.starts_with("http://")
        && !config.discord.api_base.starts_with("https://")
    {
        anyhow::bail!(
            "discord.api_base must be an http(s) URL, got '{}'",
            config.discord.api_base
        );
    }

    for (name, path) in [
        ("ytdlp_path", &tools.ytdlp_path),
        ("ffmpeg_path", &tools.ffmpeg_path),
        ("ffprobe_path", &tools.ffprobe_path),
    ] {
        if let Some(p) = path {
            if !p.exists() {
                tracing::warn!("tools.{} does not exist: {:?}", name, p);
            }
        }
    }

    Ok(())
}
