// src/webdriver/mod.rs
pub mod client;
pub mod html;
pub mod models;

#[cfg(test)]
pub mod fixture;

use async_trait::async_trait;
use crate::utils::error::DriverError;

/// Opaque handle to an element on the currently loaded page.
/// Handles become stale once the browser navigates away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: String,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One browser-automation session. Every operation acts on the current page.
#[async_trait]
pub trait Browser: Send {
    /// Loads `url` and waits (bounded) for it to render.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// All elements carrying the given (possibly compound, `.`-separated) class, in document order.
    async fn find_by_class(&mut self, class: &str) -> Result<Vec<Element>, DriverError>;

    /// Rendered text of an element, untrimmed.
    async fn element_text(&mut self, element: &Element) -> Result<String, DriverError>;

    async fn click(&mut self, element: &Element) -> Result<(), DriverError>;

    async fn page_source(&mut self) -> Result<String, DriverError>;

    /// Releases the session. Calling it twice is a no-op.
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Creates browser sessions; one session is opened per scrape call.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Browser;

    async fn open(&self) -> Result<Self::Session, DriverError>;
}

/// Closes a session at the end of a scrape, logging rather than propagating
/// teardown failures so they never mask the scrape result.
pub async fn close_quietly<B: Browser>(session: &mut B) {
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
}

/// Faults after which the session itself is unusable, as opposed to a problem with one page.
pub fn is_session_fault(error: &DriverError) -> bool {
    matches!(
        error,
        DriverError::NotFound(_) | DriverError::RuntimeNotFound(_) | DriverError::SessionCreation(_)
    )
}

/// Builds the CSS selector for a class identifier such as `YMlKec.fxKbKc`.
pub fn class_selector(class: &str) -> Result<String, DriverError> {
    let parts: Vec<&str> = class.split('.').map(str::trim).collect();
    if parts.is_empty() || parts.iter().any(|p| p.is_empty() || p.contains(char::is_whitespace)) {
        return Err(DriverError::InvalidSelector(class.to_string()));
    }
    Ok(parts.iter().map(|p| format!(".{}", p)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_class_becomes_chained_selector() {
        assert_eq!(class_selector("kHAtIb").unwrap(), ".kHAtIb");
        assert_eq!(class_selector("YMlKec.fxKbKc").unwrap(), ".YMlKec.fxKbKc");
    }

    #[test]
    fn malformed_class_is_rejected() {
        assert!(matches!(class_selector(""), Err(DriverError::InvalidSelector(_))));
        assert!(matches!(class_selector("a..b"), Err(DriverError::InvalidSelector(_))));
        assert!(matches!(class_selector("a b"), Err(DriverError::InvalidSelector(_))));
    }
}
