//! Headless Chromium driven over the DevTools protocol.
//!
//! Each session launches its own browser process with a private profile
//! directory, so concurrent sessions share no cookies or history. The CDP
//! event handler runs on a spawned task that is aborted on close.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{check_status, Navigation, PageSession, Renderer};
use crate::config::BrowserConfig;
use crate::error::{Result, SearchError};

/// Reads the document's HTTP status from the Navigation Timing API.
const STATUS_SCRIPT: &str =
    "(() => { const e = performance.getEntriesByType('navigation')[0]; \
     return e && e.responseStatus ? e.responseStatus : null; })()";

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Launches one Chromium per session with the configured presentation.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    config: BrowserConfig,
}

impl ChromiumRenderer {
    /// Create a renderer; nothing is launched until a session is opened.
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-sandbox".to_owned(),
            "--disable-dev-shm-usage".to_owned(),
            "--disable-blink-features=AutomationControlled".to_owned(),
            format!("--lang={}", self.config.locale),
            format!("--user-agent={}", self.config.user_agent),
        ];
        if self.config.ignore_https_errors {
            args.push("--ignore-certificate-errors".to_owned());
        }
        args
    }
}

impl Renderer for ChromiumRenderer {
    type Session = ChromiumSession;

    async fn open_session(&self) -> Result<ChromiumSession> {
        let profile_dir =
            std::env::temp_dir().join(format!("linkfinder-{:016x}", rand::random::<u64>()));
        let (width, height) = self.config.viewport;

        let mut builder = CdpConfig::builder()
            .window_size(width, height)
            .user_data_dir(&profile_dir)
            .request_timeout(self.config.action_timeout())
            .args(self.launch_args());
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(ref exe) = self.config.executable {
            builder = builder.chrome_executable(exe);
        }
        let cdp_config = builder
            .build()
            .map_err(|e| SearchError::Browser(format!("invalid browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| SearchError::Browser(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(SearchError::Browser(format!("failed to open tab: {e}")));
            }
        };

        tracing::debug!(profile = %profile_dir.display(), "browser session opened");
        Ok(ChromiumSession {
            browser,
            page,
            handler_task,
            profile_dir,
            action_timeout: self.config.action_timeout(),
        })
    }
}

/// A live Chromium process with one tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
    action_timeout: Duration,
}

impl ChromiumSession {
    async fn action<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, CdpError>>,
    {
        match tokio::time::timeout(self.action_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(SearchError::Browser(format!("{what}: {e}"))),
            Err(_) => Err(SearchError::Browser(format!(
                "{what} timed out after {}ms",
                self.action_timeout.as_millis()
            ))),
        }
    }
}

impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Err(_) => {
                return Err(SearchError::NavigationTimeout(format!(
                    "{url} after {}ms",
                    timeout.as_millis()
                )));
            }
            Ok(Err(e)) => return Err(SearchError::NavigationFailed(format!("{url}: {e}"))),
            Ok(Ok(_)) => {}
        }

        let status = self
            .page
            .evaluate(STATUS_SCRIPT)
            .await
            .ok()
            .and_then(|r| r.into_value::<Option<u16>>().ok())
            .flatten();
        check_status(url, status)?;

        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_owned());
        tracing::trace!(url, ?status, final_url, "navigated");
        Ok(Navigation { status, final_url })
    }

    async fn html(&mut self) -> Result<String> {
        self.action("read page content", self.page.content()).await
    }

    async fn current_url(&mut self) -> Result<String> {
        let url = self.action("read page URL", self.page.url()).await?;
        Ok(url.unwrap_or_default())
    }

    async fn submit_search(&mut self, selector: &str, text: &str, timeout: Duration) -> Result<()> {
        let input = self
            .action("find search input", self.page.find_element(selector))
            .await?;
        self.action("focus search input", input.click()).await?;
        self.action("type query", input.type_str(text)).await?;
        self.action("submit query", input.press_key("Enter")).await?;

        if tokio::time::timeout(timeout, self.page.wait_for_navigation())
            .await
            .is_err()
        {
            tracing::debug!(selector, "no navigation after search submit");
        }
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, index: usize, settle: Duration) -> Result<()> {
        let quoted = serde_json::to_string(selector)
            .map_err(|e| SearchError::Parse(format!("unencodable selector: {e}")))?;
        let script = format!(
            "(() => {{ const el = document.querySelector({quoted}); \
             if (!el || el.options.length <= {index}) return false; \
             el.selectedIndex = {index}; \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true; }})()"
        );

        let result = self.action("select option", self.page.evaluate(script)).await?;
        let applied = result.into_value::<bool>().unwrap_or(false);
        if !applied {
            return Err(SearchError::Browser(format!(
                "no option {index} in {selector}"
            )));
        }
        tokio::time::sleep(settle).await;
        Ok(())
    }

    async fn close(mut self) {
        match tokio::time::timeout(CLOSE_TIMEOUT, self.browser.close()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "browser close error"),
            Err(_) => tracing::debug!("browser close timed out"),
        }
        let _ = tokio::time::timeout(CLOSE_TIMEOUT, self.browser.wait()).await;
        self.handler_task.abort();
        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            tracing::trace!(error = %e, "profile directory not removed");
        }
        tracing::debug!("browser session closed");
    }
}
