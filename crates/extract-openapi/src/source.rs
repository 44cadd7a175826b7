//! Source acquisition: local files and remote `http(s)` URLs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use extract_openapi_telemetry::log_downloading;
use thiserror::Error;

/// Default timeout for remote fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("extract-openapi/", env!("CARGO_PKG_VERSION"));

/// Errors while acquiring the source document.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("E1000: file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch '{url}': {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch '{url}': HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Where the source document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    /// Classify a `--source` argument. Absolute `http://` and `https://`
    /// URLs are fetched, anything else is a file path.
    pub fn parse(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(s.to_string())
        } else {
            Source::File(PathBuf::from(s))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Load the document text from a file or URL.
pub fn load_source(source: &Source, timeout: Duration) -> Result<String, SourceError> {
    match source {
        Source::File(path) => read_file(path),
        Source::Url(url) => fetch(url, timeout),
    }
}

fn read_file(path: &Path) -> Result<String, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn fetch(url: &str, timeout: Duration) -> Result<String, SourceError> {
    log_downloading!(url = %url, timeout_secs = timeout.as_secs());

    let http_error = |source| SourceError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(http_error)?;

    let response = client.get(url).send().map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().map_err(http_error)
}
