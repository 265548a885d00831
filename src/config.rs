//! Configuration types for diagram rendering and the HTTP boundary.
//!
//! Rendering behaviour is controlled through [`RenderConfig`], built via its
//! [`RenderConfigBuilder`]. The config is built once at process start and is
//! immutable afterwards; every render borrows it (or shares it through an
//! `Arc` in the server).
//!
//! [`ServerConfig`] holds the few knobs only the HTTP boundary needs: the
//! listening port, the request body limit and the render concurrency cap.

use crate::error::DiagramError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Mermaid build loaded by the rendered page.
pub const DEFAULT_MERMAID_URL: &str =
    "https://cdn.jsdelivr.net/npm/mermaid@10.6.1/dist/mermaid.min.js";

/// Filename hint attached to every rendered document.
pub const DEFAULT_FILENAME: &str = "process-diagram.pdf";

/// Configuration for rendering a diagram description to PDF.
///
/// Built via [`RenderConfig::builder()`] or using [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use procflow::RenderConfig;
/// use std::time::Duration;
///
/// let config = RenderConfig::builder()
///     .render_timeout(Duration::from_secs(10))
///     .theme("forest")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Explicit Chrome/Chromium binary. If None, `chrome-locate` searches
    /// `CHROME_PATH`, well-known install paths and `PATH`.
    pub chrome_executable: Option<PathBuf>,

    /// Keep Chromium's OS-level sandbox enabled. Default: false.
    ///
    /// Containers rarely grant the namespaces the sandbox needs, so the
    /// browser is started with `--no-sandbox --disable-setuid-sandbox`.
    pub sandbox: bool,

    /// Extra command-line switches appended to the browser launch.
    pub extra_args: Vec<String>,

    /// Hard limit on browser start-up. Default: 60 s.
    pub launch_timeout: Duration,

    /// Limit on loading the page and its Mermaid script. Default: 30 s.
    pub content_load_timeout: Duration,

    /// Limit on Mermaid drawing the SVG after the page loaded. Default: 30 s.
    pub render_timeout: Duration,

    /// Limit on the print-to-PDF call. Default: 60 s.
    pub export_timeout: Duration,

    /// Delay between readiness probes while waiting on the page. Default: 100 ms.
    pub poll_interval: Duration,

    /// Write a full-page PNG here before exporting. Default: None.
    ///
    /// Purely diagnostic: a failed or slow screenshot is logged and ignored.
    pub screenshot_path: Option<PathBuf>,

    /// Limit on the diagnostic screenshot. Default: 10 s.
    pub screenshot_timeout: Duration,

    /// Mermaid script URL embedded in the page.
    pub mermaid_url: String,

    /// Mermaid theme. Default: "neutral".
    pub theme: String,

    /// Mermaid `securityLevel`. Default: "loose".
    pub security_level: String,

    /// Font family for the page and node labels. Default: "Arial".
    pub font_family: String,

    /// Paper size for the exported PDF. Default: A4.
    pub page_format: PageFormat,

    /// Margin on all four sides of each PDF page, in centimetres. Default: 2.0.
    pub margin_cm: f64,

    /// CSS padding around the diagram inside the page, in centimetres. Default: 2.0.
    pub page_padding_cm: f64,

    /// Filename hint returned with the document.
    pub filename: String,

    /// Optional per-stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            sandbox: false,
            extra_args: Vec::new(),
            launch_timeout: Duration::from_secs(60),
            content_load_timeout: Duration::from_secs(30),
            render_timeout: Duration::from_secs(30),
            export_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(100),
            screenshot_path: None,
            screenshot_timeout: Duration::from_secs(10),
            mermaid_url: DEFAULT_MERMAID_URL.to_string(),
            theme: "neutral".to_string(),
            security_level: "loose".to_string(),
            font_family: "Arial".to_string(),
            page_format: PageFormat::default(),
            margin_cm: 2.0,
            page_padding_cm: 2.0,
            filename: DEFAULT_FILENAME.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("chrome_executable", &self.chrome_executable)
            .field("sandbox", &self.sandbox)
            .field("extra_args", &self.extra_args)
            .field("launch_timeout", &self.launch_timeout)
            .field("content_load_timeout", &self.content_load_timeout)
            .field("render_timeout", &self.render_timeout)
            .field("export_timeout", &self.export_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("screenshot_path", &self.screenshot_path)
            .field("mermaid_url", &self.mermaid_url)
            .field("theme", &self.theme)
            .field("security_level", &self.security_level)
            .field("page_format", &self.page_format)
            .field("margin_cm", &self.margin_cm)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RenderProgressCallback>"),
            )
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Command-line switches passed to the browser on launch.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
            args.push("--disable-setuid-sandbox".to_string());
        }
        args.push("--disable-dev-shm-usage".to_string());
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.config.sandbox = enabled;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    pub fn launch_timeout(mut self, d: Duration) -> Self {
        self.config.launch_timeout = d;
        self
    }

    pub fn content_load_timeout(mut self, d: Duration) -> Self {
        self.config.content_load_timeout = d;
        self
    }

    pub fn render_timeout(mut self, d: Duration) -> Self {
        self.config.render_timeout = d;
        self
    }

    pub fn export_timeout(mut self, d: Duration) -> Self {
        self.config.export_timeout = d;
        self
    }

    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.config.poll_interval = d.max(Duration::from_millis(10));
        self
    }

    pub fn screenshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.screenshot_path = Some(path.into());
        self
    }

    pub fn screenshot_timeout(mut self, d: Duration) -> Self {
        self.config.screenshot_timeout = d;
        self
    }

    pub fn mermaid_url(mut self, url: impl Into<String>) -> Self {
        self.config.mermaid_url = url.into();
        self
    }

    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.config.theme = theme.into();
        self
    }

    pub fn security_level(mut self, level: impl Into<String>) -> Self {
        self.config.security_level = level.into();
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.config.font_family = family.into();
        self
    }

    pub fn page_format(mut self, format: PageFormat) -> Self {
        self.config.page_format = format;
        self
    }

    pub fn margin_cm(mut self, cm: f64) -> Self {
        self.config.margin_cm = cm;
        self
    }

    pub fn page_padding_cm(mut self, cm: f64) -> Self {
        self.config.page_padding_cm = cm;
        self
    }

    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.config.filename = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, DiagramError> {
        let c = &self.config;
        let timeouts = [
            ("launch", c.launch_timeout),
            ("content-load", c.content_load_timeout),
            ("render", c.render_timeout),
            ("export", c.export_timeout),
        ];
        for (name, d) in timeouts {
            if d.is_zero() {
                return Err(DiagramError::InvalidConfig(format!(
                    "{name} timeout must be greater than zero"
                )));
            }
        }
        if !(0.0..=10.0).contains(&c.margin_cm) {
            return Err(DiagramError::InvalidConfig(format!(
                "margin must be 0–10 cm, got {}",
                c.margin_cm
            )));
        }
        if let PageFormat::Custom { width_in, height_in } = c.page_format {
            if width_in <= 0.0 || height_in <= 0.0 {
                return Err(DiagramError::InvalidConfig(
                    "custom page size must be positive".into(),
                ));
            }
        }
        if c.mermaid_url.trim().is_empty() {
            return Err(DiagramError::InvalidConfig(
                "mermaid script URL must not be empty".into(),
            ));
        }
        if c.filename.trim().is_empty() {
            return Err(DiagramError::InvalidConfig(
                "filename must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Paper size of the exported PDF.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageFormat {
    /// 210 × 297 mm. (default)
    #[default]
    A4,
    /// 297 × 420 mm.
    A3,
    /// 8.5 × 11 in.
    Letter,
    /// 8.5 × 14 in.
    Legal,
    /// Arbitrary size in inches.
    Custom { width_in: f64, height_in: f64 },
}

impl PageFormat {
    /// `(width, height)` in inches, the unit the DevTools print call expects.
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (8.27, 11.69),
            PageFormat::A3 => (11.69, 16.54),
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
            PageFormat::Custom { width_in, height_in } => (*width_in, *height_in),
        }
    }
}

impl std::str::FromStr for PageFormat {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a4" => Ok(PageFormat::A4),
            "a3" => Ok(PageFormat::A3),
            "letter" => Ok(PageFormat::Letter),
            "legal" => Ok(PageFormat::Legal),
            other => Err(DiagramError::InvalidConfig(format!(
                "unknown page format '{other}' (expected a4, a3, letter or legal)"
            ))),
        }
    }
}

/// Centimetres to inches.
pub(crate) fn cm_to_in(cm: f64) -> f64 {
    cm / 2.54
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind. Default: "0.0.0.0".
    pub host: String,
    /// Listening port. Default: 5000, overridden by `PORT`.
    pub port: u16,
    /// Maximum accepted request body in bytes. Default: 10 MiB.
    pub body_limit_bytes: usize,
    /// Renders allowed to run at once; each one owns a browser. Default: 4.
    pub max_concurrent_renders: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            body_limit_bytes: 10 * 1024 * 1024,
            max_concurrent_renders: 4,
        }
    }
}

impl ServerConfig {
    /// Defaults, with `PORT`, `PROCFLOW_HOST`, `PROCFLOW_BODY_LIMIT_MB` and
    /// `PROCFLOW_MAX_RENDERS` applied when set.
    pub fn from_env() -> Result<Self, DiagramError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DiagramError> {
        let mut config = Self::default();
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| DiagramError::InvalidConfig(format!("invalid PORT '{port}'")))?;
        }
        if let Some(host) = lookup("PROCFLOW_HOST") {
            let host = host.trim();
            if !host.is_empty() {
                config.host = host.to_string();
            }
        }
        if let Some(mb) = lookup("PROCFLOW_BODY_LIMIT_MB") {
            let mb: usize = mb.trim().parse().map_err(|_| {
                DiagramError::InvalidConfig(format!("invalid PROCFLOW_BODY_LIMIT_MB '{mb}'"))
            })?;
            config.body_limit_bytes = mb.saturating_mul(1024 * 1024);
        }
        if let Some(n) = lookup("PROCFLOW_MAX_RENDERS") {
            let n: usize = n.trim().parse().map_err(|_| {
                DiagramError::InvalidConfig(format!("invalid PROCFLOW_MAX_RENDERS '{n}'"))
            })?;
            config.max_concurrent_renders = n.max(1);
        }
        Ok(config)
    }

    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_print_layout() {
        let c = RenderConfig::default();
        assert_eq!(c.page_format, PageFormat::A4);
        assert_eq!(c.margin_cm, 2.0);
        assert_eq!(c.theme, "neutral");
        assert_eq!(c.security_level, "loose");
        assert_eq!(c.filename, "process-diagram.pdf");
        assert_eq!(c.content_load_timeout, Duration::from_secs(30));
    }

    #[test]
    fn launch_args_disable_sandbox_by_default() {
        let args = RenderConfig::default().launch_args();
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--disable-setuid-sandbox".to_string()));
        assert!(args.contains(&"--disable-dev-shm-usage".to_string()));
    }

    #[test]
    fn launch_args_keep_sandbox_when_asked() {
        let config = RenderConfig::builder()
            .sandbox(true)
            .arg("--lang=en-US")
            .build()
            .unwrap();
        let args = config.launch_args();
        assert!(!args.contains(&"--no-sandbox".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--lang=en-US"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = RenderConfig::builder()
            .export_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("export timeout"));
    }

    #[test]
    fn negative_custom_page_is_rejected() {
        let result = RenderConfig::builder()
            .page_format(PageFormat::Custom {
                width_in: -1.0,
                height_in: 5.0,
            })
            .build();
        assert!(matches!(result, Err(DiagramError::InvalidConfig(_))));
    }

    #[test]
    fn page_format_parses_names() {
        assert_eq!("A4".parse::<PageFormat>().unwrap(), PageFormat::A4);
        assert_eq!("letter".parse::<PageFormat>().unwrap(), PageFormat::Letter);
        assert!("tabloid".parse::<PageFormat>().is_err());
    }

    #[test]
    fn a4_is_portrait_in_inches() {
        let (w, h) = PageFormat::A4.dimensions_in();
        assert!(w < h);
        assert!((cm_to_in(2.54) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn server_config_reads_port() {
        let c = ServerConfig::from_lookup(|k| (k == "PORT").then(|| "8080".to_string())).unwrap();
        assert_eq!(c.port, 8080);
        assert_eq!(c.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn server_config_defaults_to_5000() {
        let c = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(c.port, 5000);
        assert_eq!(c.body_limit_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn server_config_rejects_bad_port() {
        let err = ServerConfig::from_lookup(|k| (k == "PORT").then(|| "http".to_string()));
        assert!(matches!(err, Err(DiagramError::InvalidConfig(_))));
    }

    #[test]
    fn server_config_reads_limits_and_host() {
        let c = ServerConfig::from_lookup(|k| match k {
            "PROCFLOW_HOST" => Some("127.0.0.1".to_string()),
            "PROCFLOW_BODY_LIMIT_MB" => Some("2".to_string()),
            "PROCFLOW_MAX_RENDERS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(c.bind_addr(), "127.0.0.1:5000");
        assert_eq!(c.body_limit_bytes, 2 * 1024 * 1024);
        // Zero would deadlock the semaphore.
        assert_eq!(c.max_concurrent_renders, 1);

        let err = ServerConfig::from_lookup(|k| {
            (k == "PROCFLOW_MAX_RENDERS").then(|| "many".to_string())
        });
        assert!(matches!(err, Err(DiagramError::InvalidConfig(_))));
    }
}
