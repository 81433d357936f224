// src/config/mod.rs
pub mod profiles;

use std::path::PathBuf;

// --- Worksheet layout ---
pub const CONFIG_SHEET: &str = "config";
pub const RECORDS_SHEET: &str = "th_data";
pub const SUMMARY_SHEET: &str = "five_year_summaries";

// Fixed write addresses; clears always cover the full oversized range
pub const STOCKS_RANGE: &str = "A2:C1000";
pub const FUNDS_RANGE: &str = "E2:G1000";
pub const SUMMARY_CLEAR_RANGE: &str = "A2:G1000";
/// Header row starts at B1; its width follows the number of year columns
pub const SUMMARY_HEADER_ROW: u32 = 1;
pub const SUMMARY_FIRST_BODY_ROW: u32 = 2;

/// Worksheet-qualified A1 string for one of the fixed ranges.
pub fn sheet_range(sheet: &str, cells: &str) -> String {
    format!("{}!{}", sheet, cells)
}

/// Per-run scrape options shared by both pipelines.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// Page snapshots of failed keys are saved here when set
    pub debug_dir: Option<PathBuf>,
}
