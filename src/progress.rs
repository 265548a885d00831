//! Progress-callback trait for render-stage events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::RenderConfigBuilder::progress_callback`] to be told as
//! the orchestrator moves through launch, load, draw and export. The CLI
//! uses this to drive its spinner; a server could forward events to logs or
//! a metrics sink.
//!
//! # Example
//!
//! ```rust
//! use procflow::{RenderConfig, RenderProgressCallback, RenderStage};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl RenderProgressCallback for PrintStages {
//!     fn on_stage_start(&self, stage: RenderStage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = RenderConfig::builder()
//!     .progress_callback(Arc::new(PrintStages) as Arc<dyn RenderProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::RenderStage;
use std::sync::Arc;

/// Called by the render orchestrator as it moves through its stages.
///
/// Implementations must be `Send + Sync`: the server runs many renders on
/// the Tokio worker pool at once. All methods default to no-ops.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once after the description passed validation.
    fn on_render_start(&self) {}

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: RenderStage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`      — the stage that finished
    /// * `elapsed_ms` — wall-clock time spent in it
    fn on_stage_complete(&self, stage: RenderStage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called once with the size of the finished PDF.
    fn on_render_complete(&self, pdf_bytes: usize) {
        let _ = pdf_bytes;
    }

    /// Called once when the render fails, after the browser was closed.
    fn on_render_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderConfig`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;
