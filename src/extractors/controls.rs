// src/extractors/controls.rs
// Finding the statement panel's buttons. The page exposes no semantic ids, so
// controls are identified by their structural role through a swappable strategy.
use std::fmt;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::error::DriverError;
use crate::webdriver::{Browser, Element};

static YEAR_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:FY\s*)?[12][0-9]{3}$").expect("Failed to compile YEAR_LABEL_RE")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRole {
    /// Switches the statement panel to annual figures
    AnnualView,
    /// One button per fiscal-year column, left to right
    YearSelectors,
}

impl fmt::Display for ControlRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlRole::AnnualView => f.write_str("annual-view"),
            ControlRole::YearSelectors => f.write_str("year-selectors"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlHandle {
    pub element: Element,
    pub label: String,
}

pub fn is_year_label(label: &str) -> bool {
    YEAR_LABEL_RE.is_match(label.trim())
}

#[async_trait]
pub trait ControlLocator: Send + Sync {
    /// Controls currently filling `role`, in page order. Empty when none are exposed.
    async fn find_controls<B: Browser>(&self, browser: &mut B, role: ControlRole) -> Result<Vec<ControlHandle>, DriverError>;
}

async fn labeled_controls<B: Browser>(browser: &mut B, class: &str) -> Result<Vec<ControlHandle>, DriverError> {
    let elements = browser.find_by_class(class).await?;
    let mut controls = Vec::with_capacity(elements.len());
    for element in elements {
        let label = browser.element_text(&element).await?.trim().to_string();
        controls.push(ControlHandle { element, label });
    }
    Ok(controls)
}

/// Controls by position among like-styled buttons: the Annual toggle is at a fixed
/// index; year selectors are the trailing buttons. Their count is either fixed or
/// read from the page as the trailing run of year-labelled buttons.
#[derive(Debug, Clone)]
pub struct PositionalLocator {
    pub class: String,
    pub annual_index: usize,
    pub year_count: Option<usize>,
}

#[async_trait]
impl ControlLocator for PositionalLocator {
    async fn find_controls<B: Browser>(&self, browser: &mut B, role: ControlRole) -> Result<Vec<ControlHandle>, DriverError> {
        let mut controls = labeled_controls(browser, &self.class).await?;
        let found = match role {
            ControlRole::AnnualView => {
                if self.annual_index < controls.len() {
                    vec![controls.swap_remove(self.annual_index)]
                } else {
                    Vec::new()
                }
            }
            ControlRole::YearSelectors => {
                let n = match self.year_count {
                    Some(n) => n.min(controls.len()),
                    None => controls.iter().rev().take_while(|c| is_year_label(&c.label)).count(),
                };
                controls.split_off(controls.len() - n)
            }
        };
        tracing::debug!("Positional locator found {} control(s) for {}", found.len(), role);
        Ok(found)
    }
}

/// Controls by their visible label.
#[derive(Debug, Clone)]
pub struct LabelLocator {
    pub class: String,
    pub annual_label: String,
}

#[async_trait]
impl ControlLocator for LabelLocator {
    async fn find_controls<B: Browser>(&self, browser: &mut B, role: ControlRole) -> Result<Vec<ControlHandle>, DriverError> {
        let controls = labeled_controls(browser, &self.class).await?;
        let found: Vec<ControlHandle> = match role {
            ControlRole::AnnualView => controls
                .into_iter()
                .find(|c| c.label.eq_ignore_ascii_case(&self.annual_label))
                .into_iter()
                .collect(),
            ControlRole::YearSelectors => controls.into_iter().filter(|c| is_year_label(&c.label)).collect(),
        };
        tracing::debug!("Label locator found {} control(s) for {}", found.len(), role);
        Ok(found)
    }
}

/// Strategy chosen at runtime.
#[derive(Debug, Clone)]
pub enum Locator {
    Positional(PositionalLocator),
    Label(LabelLocator),
}

#[async_trait]
impl ControlLocator for Locator {
    async fn find_controls<B: Browser>(&self, browser: &mut B, role: ControlRole) -> Result<Vec<ControlHandle>, DriverError> {
        match self {
            Locator::Positional(l) => l.find_controls(browser, role).await,
            Locator::Label(l) => l.find_controls(browser, role).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webdriver::fixture::{FixtureFactory, FixturePage, FixtureSite};
    use crate::webdriver::SessionFactory;

    const URL: &str = "https://example.test/quote";
    const PANEL: &str = r#"
        <button class="btn">Overview</button>
        <button class="btn">Compare</button>
        <button class="btn">Quarterly</button>
        <button class="btn">Annual</button>
        <button class="btn">2020</button>
        <button class="btn">2021</button>
        <button class="btn">FY 2022</button>
    "#;

    async fn browser() -> crate::webdriver::fixture::FixtureBrowser {
        let factory = FixtureFactory::new(FixtureSite::new().page(URL, FixturePage::new(PANEL)));
        let mut browser = factory.open().await.unwrap();
        browser.navigate(URL).await.unwrap();
        browser
    }

    fn labels(controls: &[ControlHandle]) -> Vec<&str> {
        controls.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn year_labels() {
        assert!(is_year_label("2021"));
        assert!(is_year_label("FY 2021"));
        assert!(!is_year_label("Annual"));
        assert!(!is_year_label("20211"));
    }

    #[tokio::test]
    async fn positional_reads_year_count_from_page() {
        let mut b = browser().await;
        let locator = PositionalLocator { class: "btn".into(), annual_index: 3, year_count: None };

        let annual = locator.find_controls(&mut b, ControlRole::AnnualView).await.unwrap();
        assert_eq!(labels(&annual), ["Annual"]);

        let years = locator.find_controls(&mut b, ControlRole::YearSelectors).await.unwrap();
        assert_eq!(labels(&years), ["2020", "2021", "FY 2022"]);
    }

    #[tokio::test]
    async fn positional_fixed_count_and_missing_index() {
        let mut b = browser().await;
        let locator = PositionalLocator { class: "btn".into(), annual_index: 9, year_count: Some(2) };

        assert!(locator.find_controls(&mut b, ControlRole::AnnualView).await.unwrap().is_empty());
        let years = locator.find_controls(&mut b, ControlRole::YearSelectors).await.unwrap();
        assert_eq!(labels(&years), ["2021", "FY 2022"]);
    }

    #[tokio::test]
    async fn label_locator_matches_text() {
        let mut b = browser().await;
        let locator = Locator::Label(LabelLocator { class: "btn".into(), annual_label: "annual".into() });

        let annual = locator.find_controls(&mut b, ControlRole::AnnualView).await.unwrap();
        assert_eq!(labels(&annual), ["Annual"]);
        let years = locator.find_controls(&mut b, ControlRole::YearSelectors).await.unwrap();
        assert_eq!(years.len(), 3);
    }
}
