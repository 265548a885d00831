//! Library entry points.
//!
//! The two halves of the pipeline are exposed separately because the HTTP
//! boundary runs them as separate requests: a client generates a diagram,
//! may edit it, then asks for the PDF. [`convert`] chains them for callers
//! that go straight from outline to document.

use crate::config::RenderConfig;
use crate::error::DiagramError;
use crate::output::{RenderOutput, RenderStats};
use crate::pipeline::chromium::ChromiumEngine;
use crate::pipeline::engine::RenderEngine;
use crate::pipeline::mermaid::{self, DiagramDescription};
use crate::pipeline::outline;
use crate::pipeline::render;
use std::path::Path;
use tracing::{debug, info};

/// Turn an outline into a Mermaid flowchart description.
///
/// # Errors
/// [`DiagramError::EmptyInput`] when `text` is empty or whitespace only.
/// Any other text succeeds; lines that are not steps are ignored.
///
/// # Example
/// ```rust
/// let d = procflow::generate_diagram("1. Plan\n- Scope\n2. Build").unwrap();
/// assert!(d.as_str().starts_with("graph TD\n"));
/// ```
pub fn generate_diagram(text: &str) -> Result<DiagramDescription, DiagramError> {
    if outline::trim_line(text).is_empty() {
        return Err(DiagramError::EmptyInput);
    }
    let description = mermaid::compile(text);
    debug!(
        "Generated diagram with {} statements",
        description.statement_count()
    );
    Ok(description)
}

/// Render a diagram description to PDF with headless Chromium.
pub async fn render_pdf(text: &str, config: &RenderConfig) -> Result<RenderOutput, DiagramError> {
    render_pdf_with(text, config, &ChromiumEngine::new()).await
}

/// Render a diagram description to PDF with a caller-supplied engine.
pub async fn render_pdf_with(
    text: &str,
    config: &RenderConfig,
    engine: &dyn RenderEngine,
) -> Result<RenderOutput, DiagramError> {
    render::render(text, config, engine).await
}

/// Outline straight to PDF.
pub async fn convert(outline: &str, config: &RenderConfig) -> Result<RenderOutput, DiagramError> {
    let description = generate_diagram(outline)?;
    render::render_description(&description, config, &ChromiumEngine::new()).await
}

/// Render a description and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    text: &str,
    output_path: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<RenderStats, DiagramError> {
    let output = render_pdf(text, config).await?;
    write_document(output_path.as_ref(), output.document.as_bytes()).await?;
    Ok(output.stats)
}

/// Atomically write `bytes` to `path`, creating parent directories.
pub async fn write_document(path: &Path, bytes: &[u8]) -> Result<(), DiagramError> {
    let write_failed = |source: std::io::Error| DiagramError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
