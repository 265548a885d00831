//! CLI binary for procflow.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RenderConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use procflow::pipeline::input::resolve_input;
use procflow::server;
use procflow::{
    generate_diagram, render_pdf, PageFormat, ProgressCallback, RenderConfig, RenderOutput,
    RenderProgressCallback, RenderStage, ServerConfig,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that names the running stage and logs a line as each finishes.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Rendering");
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: RenderStage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: RenderStage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<24} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_render_complete(&self, _pdf_bytes: usize) {
        self.bar.finish_and_clear();
    }

    fn on_render_error(&self, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("  {} {}", red("✗"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the Mermaid description for an outline
  procflow diagram steps.txt

  # Read the outline from stdin
  printf '1. Plan\n- Scope\n2. Build\n' | procflow diagram -

  # Render an (edited) description to PDF
  procflow pdf diagram.mmd -o process.pdf

  # Outline straight to PDF, US Letter, forest theme
  procflow convert steps.txt -o process.pdf --page-format letter --theme forest

  # Keep a screenshot of the page for debugging
  procflow convert steps.txt --screenshot debug-screenshot.png

  # Run the HTTP server
  procflow serve --port 5000

OUTLINE FORMAT:
  1. Numbered lines become main steps, chained top to bottom.
  - Dashed lines become sub-steps of the step above them.
  Any other line is ignored.

ENVIRONMENT VARIABLES:
  CHROME_PATH             Chrome/Chromium executable to use
  PORT                    Server listening port (default 5000)
  PROCFLOW_HOST           Server bind address (default 0.0.0.0)
  PROCFLOW_MAX_RENDERS    Concurrent renders allowed by the server (default 4)
  PROCFLOW_BODY_LIMIT_MB  Server request body limit in MiB (default 10)
  RUST_LOG                Log filter, e.g. procflow=debug
"#;

/// Turn plain-text process outlines into flowchart PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "procflow",
    version,
    about = "Turn plain-text process outlines into Mermaid flowcharts and PDFs",
    long_about = "Turn a numbered process outline into a Mermaid `graph TD` flowchart, \
and print it to PDF through headless Chromium. Also serves the same operations over HTTP.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PROCFLOW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PROCFLOW_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "PROCFLOW_NO_PROGRESS")]
    no_progress: bool,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, global = true, env = "PROCFLOW_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Mermaid description for an outline.
    Diagram {
        /// Outline file, `-` for stdin, or HTTP/HTTPS URL.
        input: String,

        /// Write the description here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a Mermaid description to PDF.
    Pdf {
        /// Description file, `-` for stdin, or HTTP/HTTPS URL.
        input: String,

        #[command(flatten)]
        out: OutputArgs,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Outline straight to PDF.
    Convert {
        /// Outline file, `-` for stdin, or HTTP/HTTPS URL.
        input: String,

        #[command(flatten)]
        out: OutputArgs,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Serve /generate-diagram and /generate-pdf over HTTP.
    Serve {
        /// Listening port. Default: $PORT, else 5000.
        #[arg(long)]
        port: Option<u16>,

        /// Bind address. Default: $PROCFLOW_HOST, else 0.0.0.0.
        #[arg(long)]
        host: Option<String>,

        /// Renders allowed to run at once. Default: $PROCFLOW_MAX_RENDERS, else 4.
        #[arg(long)]
        max_renders: Option<usize>,

        /// Request body limit in MiB. Default: $PROCFLOW_BODY_LIMIT_MB, else 10.
        #[arg(long)]
        body_limit_mb: Option<usize>,

        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write the PDF here. Default: process-diagram.pdf
    #[arg(short, long, env = "PROCFLOW_OUTPUT")]
    output: Option<PathBuf>,

    /// Print stats and the base64 document as JSON on stdout.
    #[arg(long, env = "PROCFLOW_JSON")]
    json: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Chrome/Chromium executable.
    #[arg(long, env = "CHROME_PATH")]
    chrome: Option<PathBuf>,

    /// Keep Chromium's sandbox enabled.
    #[arg(long, env = "PROCFLOW_SANDBOX")]
    sandbox: bool,

    /// Save a full-page PNG before printing.
    #[arg(long, env = "PROCFLOW_SCREENSHOT")]
    screenshot: Option<PathBuf>,

    /// Page size: a4, a3, letter, legal.
    #[arg(long, env = "PROCFLOW_PAGE_FORMAT", default_value = "a4")]
    page_format: PageFormat,

    /// Mermaid theme.
    #[arg(long, env = "PROCFLOW_THEME", default_value = "neutral")]
    theme: String,

    /// Mermaid script URL.
    #[arg(long, env = "PROCFLOW_MERMAID_URL")]
    mermaid_url: Option<String>,

    /// Browser launch timeout in seconds.
    #[arg(long, env = "PROCFLOW_LAUNCH_TIMEOUT", default_value_t = 60)]
    launch_timeout: u64,

    /// Page load timeout in seconds.
    #[arg(long, env = "PROCFLOW_LOAD_TIMEOUT", default_value_t = 30)]
    load_timeout: u64,

    /// Diagram drawing timeout in seconds.
    #[arg(long, env = "PROCFLOW_RENDER_TIMEOUT", default_value_t = 30)]
    render_timeout: u64,

    /// PDF export timeout in seconds.
    #[arg(long, env = "PROCFLOW_EXPORT_TIMEOUT", default_value_t = 60)]
    export_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers render progress; library INFO logs only show when
    // it is off, and always with --verbose.
    let is_render = matches!(cli.command, Command::Pdf { .. } | Command::Convert { .. });
    let is_json = match &cli.command {
        Command::Pdf { out, .. } | Command::Convert { out, .. } => out.json,
        _ => false,
    };
    let show_progress = is_render && !cli.quiet && !cli.no_progress && !is_json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn RenderProgressCallback>)
    } else {
        None
    };

    match &cli.command {
        Command::Diagram { input, output } => {
            let text = resolve_input(input, cli.download_timeout)
                .await
                .with_context(|| format!("Failed to read '{input}'"))?;
            let description = generate_diagram(&text).context("Diagram generation failed")?;
            match output {
                Some(path) => {
                    tokio::fs::write(path, description.as_str())
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !cli.quiet {
                        eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
                    }
                }
                None => {
                    io::stdout()
                        .lock()
                        .write_all(description.as_str().as_bytes())
                        .context("Failed to write to stdout")?;
                }
            }
        }

        Command::Pdf { input, out, render } => {
            let text = resolve_input(input, cli.download_timeout)
                .await
                .with_context(|| format!("Failed to read '{input}'"))?;
            let config = build_config(render, progress)?;
            let output = render_pdf(&text, &config)
                .await
                .context("PDF generation failed")?;
            finish(&cli, out, &config, output).await?;
        }

        Command::Convert { input, out, render } => {
            let text = resolve_input(input, cli.download_timeout)
                .await
                .with_context(|| format!("Failed to read '{input}'"))?;
            let config = build_config(render, progress)?;
            let output = procflow::convert(&text, &config)
                .await
                .context("Conversion failed")?;
            finish(&cli, out, &config, output).await?;
        }

        Command::Serve {
            port,
            host,
            max_renders,
            body_limit_mb,
            render,
        } => {
            let config = build_config(render, None)?;
            let mut server_config =
                ServerConfig::from_env().context("Invalid server environment")?;
            if let Some(port) = port {
                server_config.port = *port;
            }
            if let Some(host) = host {
                server_config.host = host.clone();
            }
            if let Some(n) = max_renders {
                server_config.max_concurrent_renders = (*n).max(1);
            }
            if let Some(mb) = body_limit_mb {
                server_config.body_limit_bytes = mb.saturating_mul(1024 * 1024);
            }
            if !cli.quiet {
                eprintln!(
                    "{} Listening on {}",
                    green("◆"),
                    bold(&server_config.bind_addr())
                );
            }
            server::serve(server_config, config)
                .await
                .context("Server failed")?;
        }
    }

    Ok(())
}

/// Write the PDF and/or JSON and print the summary line.
async fn finish(
    cli: &Cli,
    out: &OutputArgs,
    config: &RenderConfig,
    output: RenderOutput,
) -> Result<()> {
    let path: Option<&Path> = match (&out.output, out.json) {
        (Some(p), _) => Some(p.as_path()),
        (None, false) => Some(Path::new(&config.filename)),
        (None, true) => None,
    };

    if let Some(path) = path {
        procflow::convert::write_document(path, output.document.as_bytes())
            .await
            .context("Failed to write PDF")?;
    }

    if out.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} bytes  {}ms  →  {}",
            green("✔"),
            output.stats.pdf_bytes,
            output.stats.total_ms,
            bold(&path.map(|p| p.display().to_string()).unwrap_or_default()),
        );
    }
    Ok(())
}

/// Map CLI args to `RenderConfig`.
fn build_config(args: &RenderArgs, progress: Option<ProgressCallback>) -> Result<RenderConfig> {
    let mut builder = RenderConfig::builder()
        .sandbox(args.sandbox)
        .page_format(args.page_format)
        .theme(args.theme.clone())
        .launch_timeout(Duration::from_secs(args.launch_timeout))
        .content_load_timeout(Duration::from_secs(args.load_timeout))
        .render_timeout(Duration::from_secs(args.render_timeout))
        .export_timeout(Duration::from_secs(args.export_timeout));

    if let Some(ref path) = args.chrome {
        builder = builder.chrome_executable(path);
    }
    if let Some(ref path) = args.screenshot {
        builder = builder.screenshot_path(path);
    }
    if let Some(ref url) = args.mermaid_url {
        builder = builder.mermaid_url(url.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
