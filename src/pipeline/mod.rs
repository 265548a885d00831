//! Pipeline stages for outline-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! The text stages are pure; only [`render`] and [`input`] do I/O.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ outline ──▶ mermaid ──▶ template ──▶ render ──▶ PDF bytes
//! (path/URL) (parse)    (graph TD)  (HTML page)  (engine)
//! ```
//!
//! 1. [`input`]    — read the outline from a file, stdin or URL
//! 2. [`outline`]  — classify numbered and dashed lines into a step graph
//! 3. [`mermaid`]  — serialise the graph as a `graph TD` description, and
//!    validate descriptions that arrive from elsewhere
//! 4. [`template`] — wrap a description in a print-ready HTML page
//! 5. [`render`]   — drive a headless browser through load, draw and export
//!    with a deadline per stage
//!
//! [`engine`] is the trait seam the orchestrator talks to; [`chromium`] is
//! the production implementation.

pub mod chromium;
pub mod engine;
pub mod input;
pub mod mermaid;
pub mod outline;
pub mod render;
pub mod template;
