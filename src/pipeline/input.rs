//! Input resolution: read outline or description text from wherever the
//! user pointed.
//!
//! Accepted forms:
//! - `-` reads standard input to EOF
//! - `http://` / `https://` downloads the body with `reqwest`
//! - anything else is a local file path
//!
//! Text is returned as-is. Whether it is empty or well-formed is decided by
//! the stage that consumes it.

use crate::error::DiagramError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Marker for "read from standard input".
pub const STDIN_MARKER: &str = "-";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to its text content.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<String, DiagramError> {
    if input == STDIN_MARKER {
        read_stdin().await
    } else if is_url(input) {
        download_text(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_stdin() -> Result<String, DiagramError> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .map_err(|e| DiagramError::Internal(format!("Failed to read stdin: {e}")))?;
    debug!("Read {} bytes from stdin", text.len());
    Ok(text)
}

async fn read_local(path_str: &str) -> Result<String, DiagramError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DiagramError::InputNotFound { path })
        }
        Err(e) => Err(DiagramError::Internal(format!(
            "Failed to read '{}': {e}",
            path.display()
        ))),
    }
}

async fn download_text(url: &str, timeout_secs: u64) -> Result<String, DiagramError> {
    info!("Downloading input from: {}", url);

    let failed = |reason: String| DiagramError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            DiagramError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let response = client.get(url).send().await.map_err(classify)?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let text = response.text().await.map_err(classify)?;
    info!("Downloaded {} bytes", text.len());
    Ok(text)
}
