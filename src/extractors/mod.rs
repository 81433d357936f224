// src/extractors/mod.rs
pub mod controls;
pub mod numbers;
pub mod records;
pub mod summary;
pub mod text;

use crate::config::ScrapeOptions;
use crate::utils::html_debug::snapshot_page;
use crate::webdriver::Browser;

/// A lookup key that produced no output, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedKey {
    pub key: String,
    pub reason: String,
}

impl SkippedKey {
    pub fn new(key: String, reason: String) -> Self {
        Self { key, reason }
    }
}

/// Saves the current page for a failed key when debug snapshots are enabled.
/// Snapshot failures are logged and otherwise ignored.
pub(crate) async fn save_snapshot<B: Browser>(
    browser: &mut B,
    options: &ScrapeOptions,
    key: &str,
    stage: &str,
    classes: &[&str],
) {
    let Some(dir) = options.debug_dir.as_deref() else {
        return;
    };
    let source = match browser.page_source().await {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Could not read page source for {}: {}", key, e);
            return;
        }
    };
    if let Err(e) = snapshot_page(dir, key, stage, &source, classes) {
        tracing::warn!("Failed to save debug snapshot for {}: {}", key, e);
    }
}
