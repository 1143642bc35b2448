use crate::core::{DocumentQuery, ScanPredicate};
use crate::dom::StaticDocument;
use crate::errors::{LocatorError, Result};
use crate::selector::Query;
use crate::types::{ElementHandle, ElementRect, ElementSnapshot, RawElement};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

const OUTER_HTML_SCRIPT: &str = "document.documentElement.outerHTML";

/// Page-coordinate box and computed visibility of every element, in
/// `querySelectorAll('*')` order.
const LAYOUT_SCRIPT: &str = r#"
JSON.stringify(Array.from(document.querySelectorAll('*')).map(function (el) {
    var r = el.getBoundingClientRect();
    var s = window.getComputedStyle(el);
    var visible = s.display !== 'none' && s.visibility !== 'hidden' && s.opacity !== '0';
    return [r.left + window.scrollX, r.top + window.scrollY, r.width, r.height, visible];
}))
"#;

#[derive(Debug, Clone, Copy)]
struct Layout {
    rect: ElementRect,
    visible: bool,
}

/// Document backed by a live headless Chrome tab.
///
/// Structural queries run against a parse of the page's serialized DOM;
/// geometry and computed visibility come from the live page. Both are
/// captured together and stay fixed until [`refresh`](Self::refresh).
pub struct ChromeDocument {
    // Keeps the browser process alive for launched documents.
    _browser: Option<Browser>,
    tab: Arc<Tab>,
    page: StaticDocument,
    layout: Vec<Layout>,
}

impl ChromeDocument {
    /// Launch Chrome, open `url` and capture the loaded page.
    pub async fn launch(url: &str, headless: bool) -> Result<Self> {
        let args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--window-size=1280,720"),
        ];

        let launch_options = LaunchOptions::default_builder()
            .headless(headless)
            .args(args)
            .build()
            .map_err(|e| LocatorError::BrowserLaunchFailed(e.to_string()))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| LocatorError::BrowserLaunchFailed(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| LocatorError::BrowserLaunchFailed(e.to_string()))?;

        tab.navigate_to(url)
            .map_err(|e| LocatorError::Document(format!("navigation to {} failed: {}", url, e)))?;
        tab.wait_until_navigated()
            .map_err(|e| LocatorError::Document(format!("navigation to {} failed: {}", url, e)))?;
        info!("Loaded {}", url);

        let mut document = Self::capture(tab).await?;
        document._browser = Some(browser);
        Ok(document)
    }

    /// Capture a tab owned by someone else.
    pub async fn from_tab(tab: Arc<Tab>) -> Result<Self> {
        Self::capture(tab).await
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// The parsed page structural queries run against.
    pub fn page(&self) -> &StaticDocument {
        &self.page
    }

    /// Re-read DOM and layout after the page changed. Handles taken before
    /// the refresh may point at different elements afterwards.
    pub async fn refresh(&mut self) -> Result<()> {
        let (page, layout) = read_page(&self.tab).await?;
        self.page = page;
        self.layout = layout;
        Ok(())
    }

    async fn capture(tab: Arc<Tab>) -> Result<Self> {
        let (page, layout) = read_page(&tab).await?;
        Ok(Self {
            _browser: None,
            tab,
            page,
            layout,
        })
    }

    fn with_layout(&self, raw: RawElement) -> RawElement {
        match self.layout.get(raw.handle.0) {
            Some(layout) => raw.with_rect(layout.rect).set_visible(layout.visible),
            None => raw,
        }
    }
}

async fn execute_script(tab: &Arc<Tab>, script: &str) -> Result<Value> {
    let result = tab
        .evaluate(script, false)
        .map_err(|e| LocatorError::JavaScriptFailed(e.to_string()))?;

    Ok(result.value.unwrap_or(Value::Null))
}

async fn read_page(tab: &Arc<Tab>) -> Result<(StaticDocument, Vec<Layout>)> {
    let html = execute_script(tab, OUTER_HTML_SCRIPT).await?;
    let html = html
        .as_str()
        .ok_or_else(|| LocatorError::JavaScriptFailed("outerHTML is not a string".to_string()))?;
    let page = StaticDocument::parse(html);

    let raw = execute_script(tab, LAYOUT_SCRIPT).await?;
    let encoded = raw
        .as_str()
        .ok_or_else(|| LocatorError::JavaScriptFailed("layout script returned no JSON".to_string()))?;
    let boxes: Vec<(f64, f64, f64, f64, bool)> = serde_json::from_str(encoded)?;

    // A reparse that disagrees with the live DOM cannot be paired up by index.
    let layout = if boxes.len() == page.tree().len() {
        boxes
            .into_iter()
            .map(|(x, y, width, height, visible)| Layout {
                rect: ElementRect::new(x, y, width, height),
                visible,
            })
            .collect()
    } else {
        warn!(
            "Live page has {} elements but its serialization parses to {}; geometry disabled",
            boxes.len(),
            page.tree().len()
        );
        Vec::new()
    };

    debug!("Captured page with {} elements", page.tree().len());
    Ok((page, layout))
}

#[async_trait]
impl DocumentQuery for ChromeDocument {
    async fn query(&self, query: &Query) -> Result<Vec<ElementHandle>> {
        if let Query::Position { x, y } = query {
            return Ok(self
                .layout
                .iter()
                .enumerate()
                .filter(|(_, l)| l.rect.x.round() as i64 == *x && l.rect.y.round() as i64 == *y)
                .map(|(i, _)| ElementHandle(i))
                .collect());
        }
        self.page.query(query).await
    }

    async fn capture_snapshot(&self, handle: ElementHandle) -> Result<ElementSnapshot> {
        let snapshot = self.page.snapshot(handle.0)?;
        Ok(match self.layout.get(handle.0) {
            Some(layout) => snapshot.with_rect(layout.rect),
            None => snapshot,
        })
    }

    async fn scan_document(&self, predicate: ScanPredicate<'_>) -> Result<Vec<RawElement>> {
        let tree = self.page.tree();
        Ok((0..tree.len())
            .filter(|&i| tree.is_content(i))
            .filter_map(|i| tree.raw_element(i))
            .map(|raw| self.with_layout(raw))
            .filter(|raw| raw.is_visible && predicate(raw))
            .collect())
    }

    async fn ancestors(&self, handle: ElementHandle, max_levels: usize) -> Result<Vec<RawElement>> {
        Ok(self
            .page
            .ancestor_elements(handle.0, max_levels)?
            .into_iter()
            .map(|raw| self.with_layout(raw))
            .collect())
    }
}
