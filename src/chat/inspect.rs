//! Helpers for inspecting message content and links.

use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

static EMOJI_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\w+:").expect("emoji pattern is valid"));

/// Why a raw string is not usable as a source reference.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("not a valid URL: {0}")]
    Malformed(String),

    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,
}

/// Parse a source reference: an absolute http(s) URL with a host.
pub fn parse_source(raw: &str) -> Result<Url, SourceError> {
    let url = Url::parse(raw.trim()).map_err(|e| SourceError::Malformed(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(SourceError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(SourceError::MissingHost);
    }

    Ok(url)
}

/// Every `:name:` emoji code in `text`, in order of appearance.
pub fn emoji_codes(text: &str) -> Vec<String> {
    EMOJI_CODE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether `url` points at Facebook video hosting.
pub fn is_facebook_video(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    host == "facebook.com" || host.ends_with(".facebook.com") || host == "fb.watch"
}

/// Whether `url` serves a GIF, judged by the `content-type` of a HEAD request.
pub async fn is_gif_url(client: &reqwest::Client, url: &Url) -> anyhow::Result<bool> {
    let response = client.head(url.clone()).send().await?;

    let is_gif = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("image/gif"));

    Ok(is_gif)
}
