//! The seam between the render orchestrator and a headless browser.
//!
//! [`RenderEngine`] starts an isolated browser; the [`RenderSession`] it
//! returns owns that process and exactly one page. The orchestrator in
//! [`super::render`] drives a session step by step and applies every
//! timeout itself, so an engine only has to perform single operations.
//!
//! The production engine is [`super::chromium::ChromiumEngine`]. Tests use
//! an in-memory fake to exercise ordering, timeouts and teardown without a
//! browser.

use crate::config::{cm_to_in, RenderConfig};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by an engine operation.
///
/// The orchestrator maps it to a [`crate::DiagramError`] variant based on
/// which stage was running.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Parameters for starting a browser, taken from [`RenderConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub sandbox: bool,
    pub timeout: std::time::Duration,
}

impl LaunchOptions {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            executable: config.chrome_executable.clone(),
            args: config.launch_args(),
            sandbox: config.sandbox,
            timeout: config.launch_timeout,
        }
    }
}

/// Print settings for the PDF export, all lengths in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin: f64,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
}

impl PdfOptions {
    pub fn from_config(config: &RenderConfig) -> Self {
        let (paper_width, paper_height) = config.page_format.dimensions_in();
        Self {
            paper_width,
            paper_height,
            margin: cm_to_in(config.margin_cm),
            print_background: true,
            prefer_css_page_size: true,
        }
    }
}

/// Starts isolated browser sessions. One session per render; never pooled.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn RenderSession>, EngineError>;
}

/// A running browser with at most one page.
///
/// [`RenderSession::close`] must be called on every path once `launch`
/// returned; the orchestrator guarantees this.
#[async_trait]
pub trait RenderSession: Send {
    /// Open the single page all later calls act on.
    async fn open_page(&mut self) -> Result<(), EngineError>;

    /// Replace the page's document with `html`.
    async fn set_content(&mut self, html: &str) -> Result<(), EngineError>;

    /// Evaluate a JavaScript expression that yields a boolean.
    async fn evaluate_bool(&mut self, expression: &str) -> Result<bool, EngineError>;

    /// Full-page PNG.
    async fn screenshot(&mut self) -> Result<Vec<u8>, EngineError>;

    /// Print the page to PDF.
    async fn print_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, EngineError>;

    /// Shut the browser down and reap its process.
    async fn close(&mut self) -> Result<(), EngineError>;
}
