// src/webdriver/html.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use scraper::{ElementRef, Html, Selector};

use crate::utils::error::DriverError;
use crate::webdriver::{class_selector, Browser, Element, SessionFactory};

const STATIC_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) quote_sync/0.1";

/// Rendered text of an element: descendant text nodes joined and whitespace-collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of every element carrying `class` in `source`, in document order.
pub fn select_texts(source: &str, class: &str) -> Result<Vec<String>, DriverError> {
    let css = class_selector(class)?;
    let selector = Selector::parse(&css).map_err(|_| DriverError::InvalidSelector(class.to_string()))?;
    let document = Html::parse_document(source);
    Ok(document.select(&selector).map(element_text).collect())
}

/// Opens static-HTML sessions: pages are fetched once and never executed,
/// so clicks are unsupported. Enough for server-rendered quote pages.
pub struct HtmlLauncher {
    http: reqwest::Client,
}

impl HtmlLauncher {
    pub fn new(timeout: Duration) -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .user_agent(STATIC_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl SessionFactory for HtmlLauncher {
    type Session = HtmlBrowser;

    async fn open(&self) -> Result<HtmlBrowser, DriverError> {
        Ok(HtmlBrowser {
            http: self.http.clone(),
            source: None,
            elements: Vec::new(),
        })
    }
}

/// Browser over fetched HTML. `scraper::Html` is not `Send`, so only the source
/// is kept and documents are parsed per lookup.
pub struct HtmlBrowser {
    http: reqwest::Client,
    source: Option<String>,
    // Texts of elements handed out since the last navigation; handles index into it
    elements: Vec<String>,
}

impl HtmlBrowser {
    fn current_source(&self) -> Result<&str, DriverError> {
        self.source
            .as_deref()
            .ok_or_else(|| DriverError::NotFound("no page loaded".to_string()))
    }
}

#[async_trait]
impl Browser for HtmlBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        tracing::debug!("Fetching {}", url);
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("HTTP {} for {}", status, url);
        }
        // Error pages are kept as the current page; lookups on them simply find nothing
        self.source = Some(response.text().await?);
        self.elements.clear();
        Ok(())
    }

    async fn find_by_class(&mut self, class: &str) -> Result<Vec<Element>, DriverError> {
        let texts = select_texts(self.current_source()?, class)?;
        let first = self.elements.len();
        self.elements.extend(texts);
        Ok((first..self.elements.len()).map(|i| Element::new(i.to_string())).collect())
    }

    async fn element_text(&mut self, element: &Element) -> Result<String, DriverError> {
        element
            .id
            .parse::<usize>()
            .ok()
            .and_then(|i| self.elements.get(i))
            .cloned()
            .ok_or_else(|| DriverError::StaleElement(element.id.clone()))
    }

    async fn click(&mut self, _element: &Element) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("click on a static HTML page"))
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.current_source().map(str::to_string)
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.source = None;
        self.elements.clear();
        Ok(())
    }
}
