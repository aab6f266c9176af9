//! HTTP File Fetcher
//!
//! Retrieves remote text files (branch map, TS templates) and writes them to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Download result with metadata
#[derive(Debug)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Network-side failures; `location()` is always the URL that was requested
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request never produced a response (DNS, refused, TLS, reset...)
    #[error("Connection error for {url}: {reason}")]
    Connection { url: String, reason: String },
    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    /// Body is not valid UTF-8
    #[error("Invalid UTF-8 from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl FetchError {
    pub fn location(&self) -> String {
        match self {
            Self::Connection { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => url.clone(),
        }
    }
}

/// Download failure: either the fetch itself or saving the body locally
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("IO error writing {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Anything that can hand back the text body behind a URL.
pub trait RemoteSource {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP source. No request timeout is applied.
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("qt-ts-updater/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<Duration>)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSource for HttpSource {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().map_err(|e| FetchError::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| FetchError::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        decode_utf8(url, body.to_vec())
    }
}

pub(crate) fn decode_utf8(url: &str, body: Vec<u8>) -> Result<String, FetchError> {
    String::from_utf8(body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        reason: e.utf8_error().to_string(),
    })
}

/// Writes remote files to local paths
pub struct Downloader<'a, S: RemoteSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: RemoteSource + ?Sized> Downloader<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Fetch `url` and write its text verbatim to `dest`, replacing any existing file.
    pub fn download(&self, url: &str, dest: &Path) -> Result<DownloadResult, DownloadError> {
        let content = self.source.fetch_text(url)?;

        fs::write(dest, content.as_bytes()).map_err(|source| DownloadError::Write {
            path: dest.to_path_buf(),
            source,
        })?;

        tracing::debug!(%url, dest = %dest.display(), bytes = content.len(), "downloaded");
        Ok(DownloadResult {
            path: dest.to_path_buf(),
            bytes_written: content.len() as u64,
        })
    }
}
