// src/webdriver/fixture.rs
// In-memory browser for tests: pages are HTML strings, clicks switch the page
// to the state registered for the clicked element's label.
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::utils::error::DriverError;
use crate::webdriver::html::select_texts;
use crate::webdriver::{Browser, Element, SessionFactory};

#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    initial: String,
    on_click: HashMap<String, String>,
}

impl FixturePage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { initial: html.into(), on_click: HashMap::new() }
    }

    /// Clicking any element whose text is `label` replaces the page with `html`.
    pub fn on_click(mut self, label: &str, html: impl Into<String>) -> Self {
        self.on_click.insert(label.to_string(), html.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    pages: HashMap<String, FixturePage>,
    // Navigating here behaves like a session that died mid-run
    lost: HashSet<String>,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FixturePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn session_lost_at(mut self, url: &str) -> Self {
        self.lost.insert(url.to_string());
        self
    }
}

/// Counts sessions so tests can check every opened session is closed.
#[derive(Clone, Default)]
pub struct FixtureFactory {
    site: Arc<FixtureSite>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub visited: Arc<Mutex<Vec<String>>>,
}

impl FixtureFactory {
    pub fn new(site: FixtureSite) -> Self {
        Self { site: Arc::new(site), ..Self::default() }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FixtureFactory {
    type Session = FixtureBrowser;

    async fn open(&self) -> Result<FixtureBrowser, DriverError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FixtureBrowser {
            factory: self.clone(),
            page: None,
            html: String::new(),
            elements: Vec::new(),
            closed: false,
        })
    }
}

pub struct FixtureBrowser {
    factory: FixtureFactory,
    page: Option<FixturePage>,
    html: String,
    elements: Vec<String>,
    closed: bool,
}

impl FixtureBrowser {
    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::NotFound("session closed".to_string()));
        }
        Ok(())
    }

    fn lookup(&self, element: &Element) -> Result<&String, DriverError> {
        element
            .id
            .parse::<usize>()
            .ok()
            .and_then(|i| self.elements.get(i))
            .ok_or_else(|| DriverError::StaleElement(element.id.clone()))
    }
}

#[async_trait]
impl Browser for FixtureBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.factory.visited.lock().unwrap().push(url.to_string());
        if self.factory.site.lost.contains(url) {
            return Err(DriverError::NotFound("session lost".to_string()));
        }
        self.page = self.factory.site.pages.get(url).cloned();
        self.html = self
            .page
            .as_ref()
            .map(|p| p.initial.clone())
            .unwrap_or_else(|| "<html><body>Not found</body></html>".to_string());
        self.elements.clear();
        Ok(())
    }

    async fn find_by_class(&mut self, class: &str) -> Result<Vec<Element>, DriverError> {
        self.ensure_open()?;
        let texts = select_texts(&self.html, class)?;
        let first = self.elements.len();
        self.elements.extend(texts);
        Ok((first..self.elements.len()).map(|i| Element::new(i.to_string())).collect())
    }

    async fn element_text(&mut self, element: &Element) -> Result<String, DriverError> {
        self.ensure_open()?;
        self.lookup(element).cloned()
    }

    async fn click(&mut self, element: &Element) -> Result<(), DriverError> {
        self.ensure_open()?;
        let label = self.lookup(element)?.trim().to_string();
        let next = self
            .page
            .as_ref()
            .and_then(|p| p.on_click.get(&label))
            .cloned()
            .ok_or_else(|| DriverError::Protocol {
                error: "element not interactable".to_string(),
                message: label.clone(),
            })?;
        self.html = next;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.ensure_open()?;
        Ok(self.html.clone())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            self.closed = true;
            self.factory.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
