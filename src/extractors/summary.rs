// src/extractors/summary.rs
// Rebuilds the multi-year income statement table. The page shows one fiscal
// year at a time; each year button is clicked and its column read in turn.
use std::collections::HashSet;

use crate::config::profiles::SummaryProfile;
use crate::config::ScrapeOptions;
use crate::extractors::controls::{ControlLocator, ControlRole};
use crate::extractors::numbers::normalize_or_raw;
use crate::extractors::{save_snapshot, SkippedKey};
use crate::storage::Cell;
use crate::utils::error::{DriverError, ReconstructError};
use crate::webdriver::{close_quietly, is_session_fault, Browser, SessionFactory};

/// Line items below the header row
pub const LINE_ITEMS: usize = 8;
/// Value of every cell not (yet) populated
pub const PLACEHOLDER: &str = "0";
pub const HEADER_LABEL: &str = "Info";

/// Header `["Info", year_1 .. year_N]` plus exactly `LINE_ITEMS` rows of
/// `[label, value_1 .. value_N]`. Unpopulated cells keep `PLACEHOLDER`.
#[derive(Debug, Clone, PartialEq)]
pub struct YearTable {
    years: Vec<String>,
    labels: Vec<Option<String>>,
    values: Vec<Vec<Cell>>,
}

impl YearTable {
    pub fn new(years: Vec<String>) -> Self {
        let width = years.len();
        Self {
            years,
            labels: vec![None; LINE_ITEMS],
            values: vec![vec![Cell::from(PLACEHOLDER); width]; LINE_ITEMS],
        }
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn year_count(&self) -> usize {
        self.years.len()
    }

    pub fn header(&self) -> Vec<Cell> {
        std::iter::once(Cell::from(HEADER_LABEL))
            .chain(self.years.iter().map(|y| Cell::from(y.as_str())))
            .collect()
    }

    /// The line-item rows, without the header.
    pub fn body(&self) -> Vec<Vec<Cell>> {
        self.labels
            .iter()
            .zip(&self.values)
            .map(|(label, values)| {
                let label = label.as_deref().unwrap_or(PLACEHOLDER);
                std::iter::once(Cell::from(label)).chain(values.iter().cloned()).collect()
            })
            .collect()
    }

    /// Header followed by the body: always `LINE_ITEMS + 1` rows of `year_count() + 1` cells.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        std::iter::once(self.header()).chain(self.body()).collect()
    }

    /// Records the label of `row` the first time it is seen; afterwards the row
    /// must keep the same label or the columns would be stitched to the wrong rows.
    fn reconcile_label(&mut self, row: usize, label: &str) -> Result<(), ReconstructError> {
        match &self.labels[row] {
            None => {
                self.labels[row] = Some(label.to_string());
                Ok(())
            }
            Some(known) if known == label => Ok(()),
            Some(known) => Err(ReconstructError::RowLabelMismatch {
                row: row + 1,
                expected: known.clone(),
                found: label.to_string(),
            }),
        }
    }

    fn set_value(&mut self, row: usize, column: usize, value: Cell) {
        self.values[row][column] = value;
    }
}

#[derive(Debug, Clone)]
pub struct TickerSummary {
    pub key: String,
    pub table: YearTable,
}

/// Tickers split by whether their table could be rebuilt. Together they cover
/// every distinct requested ticker exactly once.
#[derive(Debug, Default)]
pub struct SummarySet {
    pub working: Vec<TickerSummary>,
    pub non_working: Vec<SkippedKey>,
}

/// Splits a statement row's text into its label and current-year value.
/// The trailing token is the year-over-year change and is discarded.
/// `"Net profit margin 25.31 4.12%"` -> `("Net profit margin", "25.31")`
pub fn parse_row(text: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [label @ .., value, _change] => Some((label.join(" "), value.to_string())),
        _ => None,
    }
}

/// Rebuilds the table of each distinct ticker, in config order, with one session.
/// Per-ticker failures land in `non_working`; only session faults abort the run.
pub async fn scrape_summaries<F, L>(
    factory: &F,
    keys: &[String],
    profile: &SummaryProfile,
    locator: &L,
    options: &ScrapeOptions,
) -> Result<SummarySet, DriverError>
where
    F: SessionFactory,
    L: ControlLocator,
{
    let mut seen = HashSet::new();
    let unique: Vec<&str> = keys.iter().map(String::as_str).filter(|k| seen.insert(*k)).collect();
    if unique.is_empty() {
        tracing::info!("No five-year summary tickers configured");
        return Ok(SummarySet::default());
    }

    let mut session = factory.open().await?;
    let result = reconstruct_all(&mut session, &unique, profile, locator, options).await;
    close_quietly(&mut session).await;
    let set = result?;

    tracing::info!(
        "Rebuilt {} of {} five-year tables",
        set.working.len(),
        set.working.len() + set.non_working.len()
    );
    Ok(set)
}

async fn reconstruct_all<B: Browser, L: ControlLocator>(
    browser: &mut B,
    keys: &[&str],
    profile: &SummaryProfile,
    locator: &L,
    options: &ScrapeOptions,
) -> Result<SummarySet, DriverError> {
    let mut set = SummarySet::default();
    for key in keys {
        tracing::info!("Rebuilding five-year table for {}", key);
        match reconstruct_ticker(browser, key, profile, locator).await {
            Ok(table) => set.working.push(TickerSummary { key: key.to_string(), table }),
            Err(ReconstructError::Driver(e)) if is_session_fault(&e) => return Err(e),
            Err(e) => {
                tracing::warn!("Five-year table for {} failed: {}", key, e);
                save_snapshot(browser, options, key, "summary", &[profile.control_class, profile.row_class]).await;
                set.non_working.push(SkippedKey::new(key.to_string(), e.to_string()));
            }
        }
    }
    Ok(set)
}

/// Drives one ticker from its quote page to a completed table.
pub async fn reconstruct_ticker<B: Browser, L: ControlLocator>(
    browser: &mut B,
    key: &str,
    profile: &SummaryProfile,
    locator: &L,
) -> Result<YearTable, ReconstructError> {
    browser.navigate(&profile.url_for(key)).await?;

    let annual = locator
        .find_controls(browser, ControlRole::AnnualView)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ReconstructError::ControlNotFound(ControlRole::AnnualView.to_string()))?;
    browser.click(&annual.element).await?;

    // The panel re-renders with different controls once annual figures are shown
    let selectors = locator.find_controls(browser, ControlRole::YearSelectors).await?;
    if selectors.is_empty() {
        return Err(ReconstructError::NoYearColumns);
    }
    let mut table = YearTable::new(selectors.iter().map(|s| s.label.clone()).collect());
    tracing::debug!("{}: year columns {:?}", key, table.years);

    let mut expected_rows: Option<usize> = None;
    let mut populated = 0;
    for (column, selector) in selectors.iter().enumerate() {
        if let Err(e) = browser.click(&selector.element).await {
            if is_session_fault(&e) {
                return Err(e.into());
            }
            tracing::warn!("{}: could not select year {}: {}", key, selector.label, e);
            continue;
        }

        let rows = row_texts(browser, profile.row_class).await?;
        if rows.is_empty() {
            tracing::warn!("{}: no table rows rendered for {}", key, selector.label);
            continue;
        }
        match expected_rows {
            None => expected_rows = Some(rows.len()),
            Some(expected) if expected != rows.len() => {
                return Err(ReconstructError::RowCountMismatch {
                    expected,
                    found: rows.len(),
                    column: column + 1,
                });
            }
            Some(_) => {}
        }
        if rows.len() > LINE_ITEMS {
            tracing::warn!("{}: {} rows shown, keeping the first {}", key, rows.len(), LINE_ITEMS);
        }

        for (row, text) in rows.iter().take(LINE_ITEMS).enumerate() {
            let Some((label, value)) = parse_row(text) else {
                tracing::debug!("{}: row {} '{}' has too few tokens", key, row + 1, text);
                continue;
            };
            table.reconcile_label(row, &label)?;
            table.set_value(row, column, normalize_or_raw(&value));
        }
        populated += 1;
    }

    if populated == 0 {
        return Err(ReconstructError::NoColumnsPopulated);
    }
    Ok(table)
}

/// Text of every statement row except the header, keeping blank rows so that
/// positions stay aligned.
async fn row_texts<B: Browser>(browser: &mut B, row_class: &str) -> Result<Vec<String>, DriverError> {
    let elements = browser.find_by_class(row_class).await?;
    let mut texts = Vec::with_capacity(elements.len().saturating_sub(1));
    for element in elements.iter().skip(1) {
        texts.push(browser.element_text(element).await?.trim().to_string());
    }
    Ok(texts)
}
