//! In-memory renderer for unit tests.
//!
//! Serves canned HTML keyed by canonical URL, simulates timeouts and error
//! statuses, records every navigation, and models `<select>` controls by
//! swapping the current page's HTML per chosen option.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{check_status, Navigation, PageSession, Renderer};
use crate::error::{Result, SearchError};
use crate::orchestrator::url_normalize::canonicalize;

#[derive(Debug, Clone)]
struct FakePage {
    status: u16,
    html: String,
    /// `{q}` is replaced by the encoded query on submit.
    search_target: Option<String>,
    /// Per select selector, the page HTML after choosing each option.
    variants: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct FakeSite {
    pages: HashMap<String, FakePage>,
    timeouts: HashSet<String>,
    visits: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Builder and handle for a fake site.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRenderer {
    site: Arc<FakeSite>,
}

fn key(url: &str) -> String {
    canonicalize(url).unwrap_or_else(|_| url.to_owned())
}

impl FakeRenderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn site_mut(&mut self) -> &mut FakeSite {
        Arc::get_mut(&mut self.site).expect("configure the fake before cloning it")
    }

    /// Serve `html` with status 200 at `url`.
    pub(crate) fn page(mut self, url: &str, html: &str) -> Self {
        self.site_mut().pages.insert(
            key(url),
            FakePage {
                status: 200,
                html: html.to_owned(),
                search_target: None,
                variants: HashMap::new(),
            },
        );
        self
    }

    /// Serve an empty page with the given status at `url`.
    pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
        let page = self.site_mut().pages.entry(key(url)).or_insert(FakePage {
            status,
            html: String::new(),
            search_target: None,
            variants: HashMap::new(),
        });
        page.status = status;
        self
    }

    /// Navigations to `url` time out.
    pub(crate) fn timeout(mut self, url: &str) -> Self {
        self.site_mut().timeouts.insert(key(url));
        self
    }

    /// Submitting a search on `url` navigates to `target` (`{q}` = query).
    pub(crate) fn search_to(mut self, url: &str, target: &str) -> Self {
        if let Some(page) = self.site_mut().pages.get_mut(&key(url)) {
            page.search_target = Some(target.to_owned());
        }
        self
    }

    /// Choosing option `i` of `selector` on `url` turns the page into `htmls[i]`.
    pub(crate) fn variants(mut self, url: &str, selector: &str, htmls: Vec<String>) -> Self {
        if let Some(page) = self.site_mut().pages.get_mut(&key(url)) {
            page.variants.insert(selector.to_owned(), htmls);
        }
        self
    }

    /// Every navigation attempted, in order (as requested, not canonical).
    pub(crate) fn visits(&self) -> Vec<String> {
        self.site
            .visits
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    pub(crate) fn opened(&self) -> usize {
        self.site.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.site.closed.load(Ordering::SeqCst)
    }
}

impl Renderer for FakeRenderer {
    type Session = FakeSession;

    async fn open_session(&self) -> Result<FakeSession> {
        self.site.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            site: Arc::clone(&self.site),
            current_key: None,
            current_url: String::new(),
            current_html: String::new(),
        })
    }
}

pub(crate) struct FakeSession {
    site: Arc<FakeSite>,
    current_key: Option<String>,
    current_url: String,
    current_html: String,
}

impl FakeSession {
    fn go(&mut self, url: &str, timeout: Duration) -> Result<Navigation> {
        if let Ok(mut visits) = self.site.visits.lock() {
            visits.push(url.to_owned());
        }
        let k = key(url);
        if self.site.timeouts.contains(&k) {
            return Err(SearchError::NavigationTimeout(format!(
                "{url} after {}ms",
                timeout.as_millis()
            )));
        }
        let Some(page) = self.site.pages.get(&k) else {
            return Err(SearchError::NavigationFailed(format!("{url} returned 404")));
        };
        check_status(url, Some(page.status))?;

        self.current_key = Some(k);
        self.current_url = url.to_owned();
        self.current_html = page.html.clone();
        Ok(Navigation {
            status: Some(page.status),
            final_url: url.to_owned(),
        })
    }

    fn current_page(&self) -> Option<&FakePage> {
        self.current_key.as_ref().and_then(|k| self.site.pages.get(k))
    }
}

impl PageSession for FakeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation> {
        self.go(url, timeout)
    }

    async fn html(&mut self) -> Result<String> {
        Ok(self.current_html.clone())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.current_url.clone())
    }

    async fn submit_search(&mut self, selector: &str, text: &str, timeout: Duration) -> Result<()> {
        let target = self
            .current_page()
            .and_then(|p| p.search_target.clone())
            .ok_or_else(|| SearchError::Browser(format!("no element for {selector}")))?;
        let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
        self.go(&target.replace("{q}", &encoded), timeout)?;
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, index: usize, _settle: Duration) -> Result<()> {
        let html = self
            .current_page()
            .and_then(|p| p.variants.get(selector))
            .and_then(|v| v.get(index))
            .cloned()
            .ok_or_else(|| SearchError::Browser(format!("no option {index} in {selector}")))?;
        self.current_html = html;
        Ok(())
    }

    async fn close(self) {
        self.site.closed.fetch_add(1, Ordering::SeqCst);
    }
}
