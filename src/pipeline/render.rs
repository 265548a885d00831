//! Render orchestration: diagram description → PDF through a headless browser.
//!
//! ## Stages
//!
//! ```text
//! validate ─▶ launch ─▶ open page ─▶ load HTML ─▶ wait for SVG ─▶ [screenshot] ─▶ print PDF
//!             (60 s)                 (30 s)        (30 s)          (10 s)          (60 s)
//! ```
//!
//! Stages run strictly in order and each carries its own deadline; the first
//! failure ends the render. Validation happens before anything is launched,
//! so a malformed payload never costs a browser.
//!
//! ## Teardown
//!
//! Once [`RenderEngine::launch`] returns a session, [`RenderSession::close`]
//! is awaited exactly once before [`render`] returns, whatever the outcome.
//! A failing close is logged and never replaces the render's own result.
//!
//! ## Isolation
//!
//! Every call launches its own browser. Nothing is pooled or cached between
//! renders, so a diagram that wedges Mermaid only ever takes down its own
//! process.

use super::engine::{EngineError, LaunchOptions, PdfOptions, RenderEngine, RenderSession};
use super::mermaid::DiagramDescription;
use super::template::{self, CONTENT_READY_PROBE, DIAGRAM_READY_PROBE};
use crate::config::RenderConfig;
use crate::error::{DiagramError, RenderStage};
use crate::output::{RenderOutput, RenderStats, RenderedDocument};
use crate::progress::RenderProgressCallback;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Validate `text` as a diagram description and render it to PDF.
///
/// # Errors
/// - [`DiagramError::InvalidDiagramFormat`]: empty or missing `graph TD`;
///   no browser is launched.
/// - [`DiagramError::EnvironmentLaunchFailure`]: browser failed or took too
///   long to start, or the page could not be opened.
/// - [`DiagramError::RenderTimeout`]: page load or Mermaid drawing missed
///   its deadline.
/// - [`DiagramError::ExportFailed`]: print-to-PDF failed or timed out.
pub async fn render(
    text: &str,
    config: &RenderConfig,
    engine: &dyn RenderEngine,
) -> Result<RenderOutput, DiagramError> {
    let description = DiagramDescription::parse(text)?;
    render_description(&description, config, engine).await
}

/// Render an already-validated description.
pub async fn render_description(
    description: &DiagramDescription,
    config: &RenderConfig,
    engine: &dyn RenderEngine,
) -> Result<RenderOutput, DiagramError> {
    let total_start = Instant::now();
    let progress = config.progress_callback.as_deref();
    let mut stats = RenderStats::default();

    info!(
        "Rendering diagram: {} statements",
        description.statement_count()
    );
    if let Some(cb) = progress {
        cb.on_render_start();
    }

    // ── Step 1: Launch an isolated browser ───────────────────────────────
    let launch_options = LaunchOptions::from_config(config);
    let launched = timed(progress, RenderStage::Launch, &mut stats.launch_ms, async {
        match timeout(config.launch_timeout, engine.launch(&launch_options)).await {
            Ok(Ok(session)) => Ok(session),
            Ok(Err(e)) => Err(DiagramError::EnvironmentLaunchFailure { detail: e.0 }),
            Err(_) => Err(DiagramError::EnvironmentLaunchFailure {
                detail: format!(
                    "browser did not start within {}ms",
                    config.launch_timeout.as_millis()
                ),
            }),
        }
    })
    .await;

    let mut session = match launched {
        Ok(session) => session,
        Err(e) => return Err(report_failure(progress, e)),
    };

    // ── Steps 2–7, then unconditional teardown ───────────────────────────
    let outcome = drive(session.as_mut(), description, config, &mut stats).await;

    if let Err(e) = session.close().await {
        warn!("Browser close failed: {e}");
    }

    let bytes = match outcome {
        Ok(bytes) => bytes,
        Err(e) => return Err(report_failure(progress, e)),
    };

    stats.total_ms = total_start.elapsed().as_millis() as u64;
    stats.pdf_bytes = bytes.len();
    info!(
        "Rendered PDF: {} bytes in {}ms",
        stats.pdf_bytes, stats.total_ms
    );
    if let Some(cb) = progress {
        cb.on_render_complete(bytes.len());
    }

    Ok(RenderOutput {
        document: RenderedDocument::new(bytes, config.filename.clone()),
        stats,
    })
}

/// Everything between launch and close. Any error aborts the remaining steps.
async fn drive(
    session: &mut dyn RenderSession,
    description: &DiagramDescription,
    config: &RenderConfig,
    stats: &mut RenderStats,
) -> Result<Vec<u8>, DiagramError> {
    let progress = config.progress_callback.as_deref();

    // ── Step 2: Open the page ────────────────────────────────────────────
    session
        .open_page()
        .await
        .map_err(|e| DiagramError::EnvironmentLaunchFailure {
            detail: format!("could not open page: {e}"),
        })?;

    // ── Steps 3–4: Compose HTML, load it, wait for the document ──────────
    let html = template::render_page(description, config);
    debug!("Page markup: {} bytes", html.len());

    timed(
        progress,
        RenderStage::ContentLoad,
        &mut stats.content_load_ms,
        within(config.content_load_timeout, RenderStage::ContentLoad, async {
            session
                .set_content(&html)
                .await
                .map_err(|e| DiagramError::Internal(format!("loading page failed: {e}")))?;
            poll_until(&mut *session, CONTENT_READY_PROBE, config.poll_interval).await;
            Ok(())
        }),
    )
    .await?;

    // ── Step 5: Wait for Mermaid to draw ─────────────────────────────────
    timed(
        progress,
        RenderStage::DiagramRender,
        &mut stats.diagram_render_ms,
        within(config.render_timeout, RenderStage::DiagramRender, async {
            poll_until(&mut *session, DIAGRAM_READY_PROBE, config.poll_interval).await;
            Ok(())
        }),
    )
    .await?;

    // ── Step 6: Optional diagnostic screenshot ───────────────────────────
    if let Some(path) = &config.screenshot_path {
        stats.screenshot_captured =
            capture_screenshot(session, path, config.screenshot_timeout).await;
    }

    // ── Step 7: Export ───────────────────────────────────────────────────
    let pdf_options = PdfOptions::from_config(config);
    timed(progress, RenderStage::Export, &mut stats.export_ms, async {
        match timeout(config.export_timeout, session.print_pdf(&pdf_options)).await {
            Ok(Ok(bytes)) if bytes.is_empty() => Err(DiagramError::ExportFailed {
                detail: "browser returned an empty document".into(),
            }),
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(DiagramError::ExportFailed { detail: e.0 }),
            Err(_) => Err(DiagramError::ExportFailed {
                detail: format!(
                    "print to PDF did not finish within {}ms",
                    config.export_timeout.as_millis()
                ),
            }),
        }
    })
    .await
}

/// Evaluate `probe` until it returns `true`. Never returns otherwise; the
/// caller bounds it with a deadline.
///
/// Evaluation errors are treated as "not yet": while a document is being
/// replaced the page briefly has no execution context.
async fn poll_until(session: &mut dyn RenderSession, probe: &str, interval: Duration) {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match session.evaluate_bool(probe).await {
            Ok(true) => {
                debug!("Probe satisfied after {attempts} attempt(s)");
                return;
            }
            Ok(false) => {}
            Err(e) => debug!("Probe attempt {attempts} failed: {e}"),
        }
        sleep(interval).await;
    }
}

/// Bound `fut` by `limit`, mapping expiry to [`DiagramError::RenderTimeout`].
async fn within<T>(
    limit: Duration,
    stage: RenderStage,
    fut: impl Future<Output = Result<T, DiagramError>>,
) -> Result<T, DiagramError> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{stage} exceeded {}ms", limit.as_millis());
            Err(DiagramError::RenderTimeout {
                stage,
                timeout_ms: limit.as_millis() as u64,
            })
        }
    }
}

/// Run one stage, recording its duration and notifying the callback.
async fn timed<T>(
    progress: Option<&dyn RenderProgressCallback>,
    stage: RenderStage,
    elapsed_ms: &mut u64,
    fut: impl Future<Output = Result<T, DiagramError>>,
) -> Result<T, DiagramError> {
    if let Some(cb) = progress {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let result = fut.await;
    *elapsed_ms = start.elapsed().as_millis() as u64;
    if result.is_ok() {
        debug!("{stage} done in {}ms", *elapsed_ms);
        if let Some(cb) = progress {
            cb.on_stage_complete(stage, *elapsed_ms);
        }
    }
    result
}

/// Best-effort full-page PNG. Returns whether a file was written.
async fn capture_screenshot(
    session: &mut dyn RenderSession,
    path: &Path,
    limit: Duration,
) -> bool {
    let png = match timeout(limit, session.screenshot()).await {
        Ok(Ok(png)) => png,
        Ok(Err(EngineError(e))) => {
            warn!("Diagnostic screenshot failed: {e}");
            return false;
        }
        Err(_) => {
            warn!("Diagnostic screenshot timed out after {}ms", limit.as_millis());
            return false;
        }
    };
    match tokio::fs::write(path, &png).await {
        Ok(()) => {
            debug!("Diagnostic screenshot written to {}", path.display());
            true
        }
        Err(e) => {
            warn!("Could not write screenshot to {}: {e}", path.display());
            false
        }
    }
}

fn report_failure(progress: Option<&dyn RenderProgressCallback>, e: DiagramError) -> DiagramError {
    warn!("Render failed ({}): {e}", e.kind());
    if let Some(cb) = progress {
        cb.on_render_error(&e.to_string());
    }
    e
}
