//! yt-dlp backed [`Extractor`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{Extractor, FormatSelector, RemoteMetadata, DOWNLOAD_STEM};
use crate::tools::ToolConfig;
use crate::{Error, Result, Workspace};

/// Substring yt-dlp prints when a `-f` selector matches nothing.
const FORMAT_UNAVAILABLE: &str = "Requested format is not available";

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(rename = "_type")]
    kind: Option<String>,
    duration: Option<f64>,
    extractor: Option<String>,
    extractor_key: Option<String>,
    title: Option<String>,
    webpage_url: Option<String>,
    #[serde(default)]
    entries: Vec<InfoJson>,
}

/// Extractor that shells out to the `yt-dlp` CLI.
#[derive(Debug, Clone)]
pub struct YtDlp {
    tool: ToolConfig,
    metadata_timeout: Duration,
}

impl YtDlp {
    /// `tool`'s own timeout bounds downloads; metadata queries use
    /// `metadata_timeout`.
    pub fn new(tool: ToolConfig, metadata_timeout: Duration) -> Self {
        Self {
            tool,
            metadata_timeout,
        }
    }

    fn metadata_args(url: &Url) -> Vec<String> {
        [
            "--dump-single-json",
            "--no-playlist",
            "--playlist-items",
            "1-1",
            "--quiet",
            "--no-warnings",
            "--source-address",
            "0.0.0.0",
        ]
        .into_iter()
        .map(String::from)
        .chain(std::iter::once(url.to_string()))
        .collect()
    }

    fn download_args(url: &Url, format: FormatSelector, workspace: &Workspace) -> Vec<String> {
        let template = workspace.file(&format!("{DOWNLOAD_STEM}.%(ext)s"));
        vec![
            "-f".to_string(),
            format.as_str().to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--force-overwrites".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl Extractor for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn metadata(&self, url: &Url) -> Result<RemoteMetadata> {
        let mut cmd = self.tool.command();
        cmd.timeout(self.metadata_timeout);
        cmd.args(Self::metadata_args(url));

        let output = cmd.execute().await?;
        parse_metadata(&output.stdout)
    }

    async fn download(
        &self,
        url: &Url,
        format: FormatSelector,
        workspace: &Workspace,
    ) -> Result<PathBuf> {
        tracing::info!("downloading {url} with format '{format}'");

        let mut cmd = self.tool.command();
        cmd.args(Self::download_args(url, format, workspace));
        cmd.execute().await.map_err(classify_failure)?;

        workspace.find_download(DOWNLOAD_STEM).await
    }
}

/// Parse `--dump-single-json` output, descending into the first playlist
/// entry when the URL resolved to a playlist.
fn parse_metadata(json: &str) -> Result<RemoteMetadata> {
    let mut info: InfoJson = serde_json::from_str(json)?;

    if info.kind.as_deref() == Some("playlist") {
        if info.entries.is_empty() {
            return Err(Error::parse_error("yt-dlp", "playlist has no entries"));
        }
        info = info.entries.swap_remove(0);
    }

    Ok(RemoteMetadata {
        duration_secs: info.duration.filter(|d| d.is_finite() && *d >= 0.0),
        extractor: info
            .extractor
            .or(info.extractor_key)
            .map(|e| e.to_lowercase()),
        title: info.title,
        webpage_url: info.webpage_url,
    })
}

/// Turn a failed download into [`Error::FormatUnavailable`] when yt-dlp
/// reported an unsatisfiable selector; leave every other error alone.
fn classify_failure(err: Error) -> Error {
    match err {
        Error::ToolFailed { message, .. } if message.contains(FORMAT_UNAVAILABLE) => {
            Error::FormatUnavailable { message }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ytdlp() -> YtDlp {
        YtDlp::new(
            ToolConfig {
                name: "yt-dlp".into(),
                path: PathBuf::from("yt-dlp"),
                timeout: Duration::from_secs(600),
            },
            Duration::from_secs(60),
        )
    }

    #[test]
    fn parses_single_video() {
        let json = r#"{
            "_type": "video",
            "id": "abc",
            "title": "Clip",
            "duration": 42.5,
            "extractor": "youtube",
            "extractor_key": "Youtube",
            "webpage_url": "https://www.youtube.com/watch?v=abc"
        }"#;
        let meta = parse_metadata(json).unwrap();
        assert_eq!(meta.duration_secs, Some(42.5));
        assert_eq!(meta.extractor.as_deref(), Some("youtube"));
        assert_eq!(meta.title.as_deref(), Some("Clip"));
        assert!(meta.is_supported());
    }

    #[test]
    fn parses_first_playlist_entry() {
        let json = r#"{
            "_type": "playlist",
            "extractor": "youtube:tab",
            "entries": [
                {"duration": 12, "extractor": "youtube", "title": "first"},
                {"duration": 900, "extractor": "youtube", "title": "second"}
            ]
        }"#;
        let meta = parse_metadata(json).unwrap();
        assert_eq!(meta.duration_secs, Some(12.0));
        assert_eq!(meta.title.as_deref(), Some("first"));
    }

    #[test]
    fn empty_playlist_is_an_error() {
        let json = r#"{"_type": "playlist", "entries": []}"#;
        assert!(parse_metadata(json).is_err());
    }

    #[test]
    fn missing_duration_is_none() {
        let json = r#"{"extractor_key": "Generic", "title": "page"}"#;
        let meta = parse_metadata(json).unwrap();
        assert_eq!(meta.duration_secs, None);
        assert_eq!(meta.extractor.as_deref(), Some("generic"));
        assert!(!meta.is_supported());
    }

    #[test]
    fn format_unavailable_is_classified() {
        let err = Error::tool_failed(
            "yt-dlp",
            "exited with status 1: ERROR: [twitter] 123: Requested format is not available. Use --list-formats",
        );
        assert!(classify_failure(err).is_format_unavailable());
    }

    #[test]
    fn other_failures_pass_through() {
        let err = Error::tool_failed("yt-dlp", "exited with status 1: ERROR: Unable to download webpage");
        assert!(matches!(classify_failure(err), Error::ToolFailed { .. }));

        let err = Error::tool_not_found("yt-dlp");
        assert!(matches!(classify_failure(err), Error::ToolNotFound { .. }));
    }

    #[test]
    fn download_args_target_workspace() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(root.path()).unwrap();
        let url = Url::parse("https://example.com/watch?v=1").unwrap();

        let args = YtDlp::download_args(&url, FormatSelector::BestVideoWorstAudio, &ws);
        assert_eq!(args[0], "-f");
        assert_eq!(args[1], "bestvideo+worstaudio");
        assert!(args.contains(&"--merge-output-format".to_string()));
        assert!(args.contains(&"--force-overwrites".to_string()));

        let template = ws.file("video.%(ext)s").to_string_lossy().to_string();
        assert!(args.contains(&template));
        assert_eq!(args.last().unwrap(), url.as_str());
    }

    #[test]
    fn metadata_args_limit_to_first_item() {
        let url = Url::parse("https://example.com/list").unwrap();
        let args = YtDlp::metadata_args(&url);
        let joined = args.join(" ");
        assert!(joined.contains("--no-playlist"));
        assert!(joined.contains("--playlist-items 1-1"));
        assert!(joined.contains("--source-address 0.0.0.0"));
        assert_eq!(ytdlp().name(), "yt-dlp");
    }
}
