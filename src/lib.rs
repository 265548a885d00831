//! # procflow
//!
//! Turn plain-text process outlines into Mermaid flowcharts and print them
//! to PDF through headless Chromium.
//!
//! ## Why this crate?
//!
//! People write processes as numbered lists with a few dashed sub-points.
//! Drawing those as boxes and arrows by hand is tedious, and the result
//! drifts from the text. This crate reads the outline as written, builds a
//! top-down flowchart from it, and lets a real browser lay the chart out so
//! the PDF looks exactly like the chart does on screen.
//!
//! ## Pipeline Overview
//!
//! ```text
//! outline text
//!  │
//!  ├─ 1. Parse      numbered lines → steps, dashed lines → sub-steps
//!  ├─ 2. Serialise  graph → `graph TD` Mermaid description
//!  │      (the HTTP boundary returns here; clients may edit the text)
//!  ├─ 3. Validate   description must start with `graph TD`
//!  ├─ 4. Launch     isolated headless Chromium, one per render
//!  ├─ 5. Draw       load page, wait for Mermaid's SVG
//!  └─ 6. Export     print to A4 PDF, close the browser
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use procflow::{convert, RenderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outline = "1. Collect requirements\n- Interview stakeholders\n2. Draft design";
//!     let output = convert(outline, &RenderConfig::default()).await?;
//!     std::fs::write(output.document.filename(), output.document.as_bytes())?;
//!     eprintln!("rendered in {}ms", output.stats.total_ms);
//!     Ok(())
//! }
//! ```
//!
//! Generating the description needs no browser:
//!
//! ```rust
//! let d = procflow::generate_diagram("1. Plan\n2. Ship").unwrap();
//! assert_eq!(d.as_str(), "graph TD\nstep0[\"Plan\"]\nstep1[\"Ship\"]\nstep0 --> step1\n");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP boundary (`/generate-diagram`, `/generate-pdf`) |
//! | `cli`    | on      | Enables the `procflow` binary (clap + anyhow + tracing-subscriber); implies `server` |
//!
//! Disable both when using only the library:
//! ```toml
//! procflow = { version = "0.1", default-features = false }
//! ```
//!
//! ## Browser
//!
//! Rendering needs Chrome or Chromium. Set `CHROME_PATH` to pick a specific
//! binary; otherwise common install locations and `PATH` are searched.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageFormat, RenderConfig, RenderConfigBuilder, ServerConfig};
pub use convert::{convert, convert_to_file, generate_diagram, render_pdf, render_pdf_with};
pub use error::{DiagramError, RenderStage};
pub use output::{RenderOutput, RenderStats, RenderedDocument};
pub use pipeline::chromium::ChromiumEngine;
pub use pipeline::engine::{RenderEngine, RenderSession};
pub use pipeline::mermaid::{compile, serialize, DiagramDescription};
pub use pipeline::outline::{parse, sanitize_label, DiagramGraph, Edge, Step, Tier};
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};
