// src/pipeline.rs
// The two user-triggered actions: fetch -> normalize -> sort -> clear -> write.
use crate::config::profiles::{RecordProfile, SummaryProfile, FUNDS, STOCKS};
use crate::config::{
    sheet_range, ScrapeOptions, RECORDS_SHEET, SUMMARY_CLEAR_RANGE, SUMMARY_FIRST_BODY_ROW, SUMMARY_HEADER_ROW,
    SUMMARY_SHEET,
};
use crate::extractors::controls::ControlLocator;
use crate::extractors::records::{scrape_records, RecordSet};
use crate::extractors::summary::{scrape_summaries, SummarySet, LINE_ITEMS};
use crate::storage::{A1Range, Cell, CellRef, ConfigSource, SyncTarget};
use crate::utils::AppError;
use crate::webdriver::SessionFactory;

#[derive(Debug, Default)]
pub struct RecordsReport {
    pub stocks: RecordSet,
    pub funds: RecordSet,
}

/// Scrapes stock quotes and fund prices for the configured keys and writes
/// each sorted set to its fixed range on the records worksheet.
pub async fn update_flat_records<F, W>(
    factory: &F,
    workbook: &mut W,
    options: &ScrapeOptions,
) -> Result<RecordsReport, AppError>
where
    F: SessionFactory,
    W: ConfigSource + SyncTarget,
{
    let config = workbook.read_config().await?;
    tracing::info!("Config: {} stocks, {} funds", config.stocks.len(), config.funds.len());

    let stocks = scrape_records(factory, &config.stocks, &STOCKS, options).await?;
    write_records(workbook, &stocks, &STOCKS).await?;

    let funds = scrape_records(factory, &config.funds, &FUNDS, options).await?;
    write_records(workbook, &funds, &FUNDS).await?;

    Ok(RecordsReport { stocks, funds })
}

async fn write_records<W: SyncTarget>(workbook: &mut W, set: &RecordSet, profile: &RecordProfile) -> Result<(), AppError> {
    let range = A1Range::parse(&sheet_range(RECORDS_SHEET, profile.range))?;
    // The config may have shrunk since the last run; stale rows must go
    workbook.clear_range(&range).await?;
    if set.records.is_empty() {
        tracing::info!("No {} records to write", profile.kind);
        return Ok(());
    }
    workbook.write_range(&range, &set.rows()).await?;
    tracing::info!("Wrote {} {} records to {}", set.records.len(), profile.kind, range);
    Ok(())
}

/// Rebuilds the five-year table of every configured ticker and writes the
/// tables as consecutive 8-row blocks under a shared year header.
pub async fn update_five_year_summary<F, W, L>(
    factory: &F,
    workbook: &mut W,
    profile: &SummaryProfile,
    locator: &L,
    options: &ScrapeOptions,
) -> Result<SummarySet, AppError>
where
    F: SessionFactory,
    W: ConfigSource + SyncTarget,
    L: ControlLocator,
{
    let config = workbook.read_config().await?;
    tracing::info!("Config: {} five-year summary tickers", config.summary_tickers.len());

    let set = scrape_summaries(factory, &config.summary_tickers, profile, locator, options).await?;
    for failed in &set.non_working {
        tracing::warn!("Not working: {} ({})", failed.key, failed.reason);
    }

    // Key column + label column + one per year
    let width = set
        .working
        .iter()
        .map(|t| t.table.year_count() + 2)
        .max()
        .unwrap_or(0);

    let mut clear = A1Range::parse(&sheet_range(SUMMARY_SHEET, SUMMARY_CLEAR_RANGE))?;
    if width > clear.cols() {
        clear.end.col = clear.start.col + width as u32 - 1;
    }
    workbook.clear_range(&clear).await?;

    let Some(first) = set.working.first() else {
        tracing::warn!("No five-year tables were rebuilt; leaving the header untouched");
        return Ok(set);
    };
    for key in header_mismatches(&set) {
        tracing::warn!("{} shows different years than {}; its block sits under a mismatched header", key, first.key);
    }
    let header = first.table.rows().swap_remove(0);
    let header_range = A1Range::block(SUMMARY_SHEET, CellRef::new(1, SUMMARY_HEADER_ROW), 1, header.len());
    workbook.write_range(&header_range, &[header]).await?;

    let mut top = SUMMARY_FIRST_BODY_ROW;
    for summary in &set.working {
        let block: Vec<Vec<Cell>> = summary
            .table
            .rows()
            .into_iter()
            .skip(1)
            .map(|row| std::iter::once(Cell::from(summary.key.as_str())).chain(row).collect())
            .collect();
        let cols = block.iter().map(Vec::len).max().unwrap_or(1);
        let range = A1Range::block(SUMMARY_SHEET, CellRef::new(0, top), LINE_ITEMS, cols);
        workbook.write_range(&range, &block).await?;
        tracing::debug!("Wrote five-year table for {} to {}", summary.key, range);
        top += LINE_ITEMS as u32;
    }

    tracing::info!("Wrote {} five-year tables", set.working.len());
    Ok(set)
}

/// Working tickers whose year columns differ from the first one, whose years form the shared header.
fn header_mismatches(set: &SummarySet) -> Vec<&str> {
    let Some(first) = set.working.first() else {
        return Vec::new();
    };
    set.working
        .iter()
        .skip(1)
        .filter(|t| t.table.years() != first.table.years())
        .map(|t| t.key.as_str())
        .collect()
}
