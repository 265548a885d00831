//! Headless Chromium engine over the DevTools protocol (`chromiumoxide`).
//!
//! Each [`ChromiumEngine::launch`] starts a fresh browser process with its
//! own DevTools connection. The connection's event handler runs on a spawned
//! Tokio task for the lifetime of the session and is aborted on close.
//!
//! If a session is dropped without [`RenderSession::close`] (for example
//! when the caller's future is cancelled), `chromiumoxide` kills the child
//! process when the `Browser` handle drops.

use super::engine::{EngineError, LaunchOptions, PdfOptions, RenderEngine, RenderSession};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Launches a new headless Chromium per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumEngine;

impl ChromiumEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn RenderSession>, EngineError> {
        let executable = match &options.executable {
            Some(path) => Some(path.clone()),
            None => match chrome_locate::locate_chrome() {
                Ok(path) => Some(path),
                Err(e) => {
                    // chromiumoxide has its own lookup; let it try before giving up.
                    debug!("chrome-locate found nothing ({e}); using chromiumoxide defaults");
                    None
                }
            },
        };

        let mut builder = BrowserConfig::builder()
            .launch_timeout(options.timeout)
            .args(options.args.iter().cloned());
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(EngineError::new)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_error)?;
        info!(
            "Chromium started ({})",
            executable
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "auto-detected".into())
        );

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("DevTools handler stopped: {e}");
                    break;
                }
            }
        });

        Ok(Box::new(ChromiumSession {
            browser,
            page: None,
            handler,
            closed: false,
        }))
    }
}

/// One browser process plus its single page.
struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    closed: bool,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, EngineError> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::new("no page open in this session"))
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn open_page(&mut self) -> Result<(), EngineError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(cdp_error)?;
        self.page = Some(page);
        Ok(())
    }

    async fn set_content(&mut self, html: &str) -> Result<(), EngineError> {
        self.page()?.set_content(html).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn evaluate_bool(&mut self, expression: &str) -> Result<bool, EngineError> {
        let result = self.page()?.evaluate(expression).await.map_err(cdp_error)?;
        result.into_value::<bool>().map_err(cdp_error)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, EngineError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page()?.screenshot(params).await.map_err(cdp_error)
    }

    async fn print_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, EngineError> {
        let params = PrintToPdfParams {
            paper_width: Some(options.paper_width),
            paper_height: Some(options.paper_height),
            margin_top: Some(options.margin),
            margin_bottom: Some(options.margin),
            margin_left: Some(options.margin),
            margin_right: Some(options.margin),
            print_background: Some(options.print_background),
            prefer_css_page_size: Some(options.prefer_css_page_size),
            ..Default::default()
        };
        self.page()?.pdf(params).await.map_err(cdp_error)
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("page close failed: {e}");
            }
        }

        let result = match self.browser.close().await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("graceful browser close failed, killing process: {e}");
                if let Some(Err(kill_err)) = self.browser.kill().await {
                    warn!("browser kill failed: {kill_err}");
                }
                Err(cdp_error(e))
            }
        };

        if let Err(e) = self.browser.wait().await {
            debug!("waiting on browser process failed: {e}");
        }
        self.handler.abort();
        debug!("Chromium session closed");
        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn cdp_error(e: impl std::fmt::Display) -> EngineError {
    EngineError::new(e.to_string())
}
