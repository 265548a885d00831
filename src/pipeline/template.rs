//! Print page markup: wraps a diagram description in a self-contained HTML
//! document that loads Mermaid and renders on load.
//!
//! The description is embedded verbatim in `<div class="mermaid">`; Mermaid
//! reads it from there when `startOnLoad` fires. Styling forces a white
//! background and black labels so the PDF looks the same regardless of the
//! theme's own colours.

use super::mermaid::DiagramDescription;
use crate::config::RenderConfig;

/// Script evaluated to decide the page and its scripts finished loading.
pub const CONTENT_READY_PROBE: &str = "document.readyState === 'complete'";

/// Script evaluated to decide Mermaid finished drawing.
pub const DIAGRAM_READY_PROBE: &str =
    "(() => { const svg = document.querySelector('.mermaid svg'); \
     return !!svg && svg.childElementCount > 0; })()";

/// Build the full HTML page for `description`.
pub fn render_page(description: &DiagramDescription, config: &RenderConfig) -> String {
    let font = &config.font_family;
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <style>
      body {{
        padding: {padding}cm;
        font-family: "{font}", sans-serif !important;
        background: white;
      }}
      .mermaid-container {{
        width: 100%;
        min-height: 80vh;
      }}
      .mermaid svg {{
        background-color: white !important;
      }}
      .label text {{
        fill: black !important;
        font-family: {font} !important;
      }}
    </style>
    <script src="{script}"></script>
  </head>
  <body>
    <div class="mermaid-container">
      <div class="mermaid">{diagram}</div>
    </div>
    <script>
      mermaid.initialize({{
        startOnLoad: true,
        securityLevel: '{security}',
        theme: '{theme}',
        flowchart: {{
          diagramPadding: 20
        }}
      }});
    </script>
  </body>
</html>
"#,
        padding = config.page_padding_cm,
        font = font,
        script = config.mermaid_url,
        diagram = description.as_str(),
        security = config.security_level,
        theme = config.theme,
    )
}
