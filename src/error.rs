//! Error types for the procflow library.
//!
//! A single [`DiagramError`] enum covers every way a request can fail.
//! The variants split into two families that callers must treat differently:
//!
//! * **Client errors**: the input itself is unusable ([`DiagramError::EmptyInput`],
//!   [`DiagramError::InvalidDiagramFormat`]). Retrying the same payload will
//!   fail the same way; the HTTP boundary answers `400`.
//!
//! * **Server errors**: the input was acceptable but rendering broke
//!   (browser did not start, Mermaid never drew, PDF export failed). These
//!   answer `500`; some are worth retrying (see [`DiagramError::is_retryable`]).
//!
//! The outline parser and serializer never return errors. Everything here is
//! raised either at the edges (empty-input check, directive check) or by the
//! render orchestrator.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the procflow library.
#[derive(Debug, Error)]
pub enum DiagramError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// Generation request with no usable text.
    #[error("Empty input received")]
    EmptyInput,

    /// Render request whose payload does not start with `graph TD`.
    #[error("Invalid Mermaid code format")]
    InvalidDiagramFormat,

    // ── Render errors ─────────────────────────────────────────────────────
    /// The headless browser could not be started.
    #[error("Failed to launch headless browser: {detail}")]
    EnvironmentLaunchFailure { detail: String },

    /// A render stage exceeded its deadline.
    #[error("Timed out after {timeout_ms}ms while waiting for {stage}")]
    RenderTimeout { stage: RenderStage, timeout_ms: u64 },

    /// The page rendered but could not be printed to PDF.
    #[error("PDF export failed: {detail}")]
    ExportFailed { detail: String },

    // ── Input / output errors (CLI) ───────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DiagramError {
    /// `true` when the caller sent something unusable (HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DiagramError::EmptyInput | DiagramError::InvalidDiagramFormat
        )
    }

    /// `true` when the same request may succeed if tried again.
    ///
    /// Launch failures are usually resource exhaustion; timeouts may pass
    /// with a smaller diagram or a less loaded host.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiagramError::EnvironmentLaunchFailure { .. }
                | DiagramError::RenderTimeout { .. }
                | DiagramError::DownloadTimeout { .. }
        )
    }

    /// Stable machine-readable name, used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            DiagramError::EmptyInput => "empty_input",
            DiagramError::InvalidDiagramFormat => "invalid_diagram_format",
            DiagramError::EnvironmentLaunchFailure { .. } => "environment_launch_failure",
            DiagramError::RenderTimeout { .. } => "render_timeout",
            DiagramError::ExportFailed { .. } => "export_failed",
            DiagramError::InputNotFound { .. } => "input_not_found",
            DiagramError::DownloadFailed { .. } => "download_failed",
            DiagramError::DownloadTimeout { .. } => "download_timeout",
            DiagramError::OutputWriteFailed { .. } => "output_write_failed",
            DiagramError::InvalidConfig(_) => "invalid_config",
            DiagramError::Internal(_) => "internal",
        }
    }
}

/// The orchestrator stage a timeout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    /// Starting the browser process.
    Launch,
    /// Loading the HTML page and its Mermaid script.
    ContentLoad,
    /// Waiting for Mermaid to draw the SVG.
    DiagramRender,
    /// Printing the page to PDF.
    Export,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RenderStage::Launch => "browser launch",
            RenderStage::ContentLoad => "page content to load",
            RenderStage::DiagramRender => "diagram to render",
            RenderStage::Export => "PDF export",
        };
        f.write_str(s)
    }
}
