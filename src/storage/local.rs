// src/storage/local.rs
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::storage::{A1Range, Cell, ConfigColumns, ConfigSource, SyncTarget};
use crate::utils::error::SyncError;

/// On-disk form of one worksheet
#[derive(Debug, Default, Serialize, Deserialize)]
struct SheetFile {
    sheet: String,
    updated_at: Option<String>,
    rows: Vec<Vec<Cell>>,
}

/// A workbook kept as one JSON grid per worksheet under a base directory.
/// Used for offline runs and as a stand-in when no spreadsheet credentials exist.
pub struct LocalWorkbook {
    base_dir: PathBuf,
    config_sheet: String,
    skip_header: bool,
}

impl LocalWorkbook {
    /// Creates a new LocalWorkbook with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P, config_sheet: &str, skip_header: bool) -> Result<Self, SyncError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(SyncError::Io)?;
        }

        Ok(Self {
            base_dir: base_path,
            config_sheet: config_sheet.to_string(),
            skip_header,
        })
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", sheet))
    }

    fn load(&self, sheet: &str) -> Result<SheetFile, SyncError> {
        let path = self.sheet_path(sheet);
        if !path.exists() {
            return Ok(SheetFile { sheet: sheet.to_string(), ..SheetFile::default() });
        }
        let raw = fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|e| SyncError::Serialization(format!("{}: {}", path.display(), e)))
    }

    fn store(&self, mut file: SheetFile) -> Result<(), SyncError> {
        file.updated_at = Some(chrono::Utc::now().to_rfc3339());
        let path = self.sheet_path(&file.sheet);
        let json = serde_json::to_string_pretty(&file).map_err(|e| SyncError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;
        tracing::debug!("Saved worksheet {}", path.display());
        Ok(())
    }

    /// Reads back every row of a worksheet.
    pub fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<Cell>>, SyncError> {
        Ok(self.load(sheet)?.rows)
    }
}

fn set_cell(grid: &mut Vec<Vec<Cell>>, row_idx: usize, col_idx: usize, value: Cell) {
    if grid.len() <= row_idx {
        grid.resize_with(row_idx + 1, Vec::new);
    }
    let row = &mut grid[row_idx];
    if row.len() <= col_idx {
        row.resize_with(col_idx + 1, Cell::empty);
    }
    row[col_idx] = value;
}

#[async_trait]
impl ConfigSource for LocalWorkbook {
    async fn read_config(&mut self) -> Result<ConfigColumns, SyncError> {
        let grid: Vec<Vec<String>> = self
            .read_sheet(&self.config_sheet)?
            .iter()
            .map(|row| row.iter().map(Cell::to_string).collect())
            .collect();
        Ok(ConfigColumns::from_grid(&grid, self.skip_header))
    }
}

#[async_trait]
impl SyncTarget for LocalWorkbook {
    async fn clear_range(&mut self, range: &A1Range) -> Result<(), SyncError> {
        let mut file = self.load(&range.sheet)?;
        let first_row = range.start.row as usize - 1;
        let first_col = range.start.col as usize;
        for row in file.rows.iter_mut().skip(first_row).take(range.rows()) {
            for cell in row.iter_mut().skip(first_col).take(range.cols()) {
                *cell = Cell::empty();
            }
        }
        self.store(file)
    }

    /// Writes `rows` starting at the range's top-left corner; cells of the range
    /// not covered by `rows` are left untouched.
    async fn write_range(&mut self, range: &A1Range, rows: &[Vec<Cell>]) -> Result<(), SyncError> {
        range.check_fits(rows)?;
        let mut file = self.load(&range.sheet)?;
        let first_row = range.start.row as usize - 1;
        let first_col = range.start.col as usize;
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                set_cell(&mut file.rows, first_row + r, first_col + c, value.clone());
            }
        }
        self.store(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_grid(rows: &[Vec<Cell>]) -> Vec<Vec<String>> {
        rows.iter().map(|r| r.iter().map(Cell::to_string).collect()).collect()
    }

    #[test]
    fn write_then_clear_leaves_neighbours_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut wb = LocalWorkbook::new(dir.path(), "config", false).unwrap();

        tokio_test::block_on(async {
            let stocks = A1Range::parse("th_data!A2:C1000").unwrap();
            let funds = A1Range::parse("th_data!E2:G1000").unwrap();
            wb.write_range(&stocks, &[vec![Cell::from("PTT"), Cell::from(35.5), Cell::from("Oct 15")]])
                .await
                .unwrap();
            wb.write_range(&funds, &[vec![Cell::from("K-FIXED"), Cell::from(11.2), Cell::from("15/10")]])
                .await
                .unwrap();

            wb.clear_range(&stocks).await.unwrap();
        });

        let rows = wb.read_sheet("th_data").unwrap();
        assert_eq!(
            text_grid(&rows),
            vec![vec![], vec!["", "", "", "", "K-FIXED", "11.2", "15/10"]]
        );
    }

    #[test]
    fn oversized_write_is_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut wb = LocalWorkbook::new(dir.path(), "config", false).unwrap();
        let header = A1Range::parse("five_year_summaries!B1:G1").unwrap();
        let row = vec![vec![Cell::from("x"); 7]];

        let result = tokio_test::block_on(wb.write_range(&header, &row));
        assert!(matches!(result, Err(SyncError::RangeOverflow { .. })));
        assert!(!dir.path().join("five_year_summaries.json").exists());
    }

    #[tokio::test]
    async fn reads_config_from_seeded_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut wb = LocalWorkbook::new(dir.path(), "config", true).unwrap();
        let seed = vec![
            vec![Cell::from("Stocks"), Cell::from("Funds"), Cell::from("Summary")],
            vec![Cell::from("PTT:BKK"), Cell::empty(), Cell::from("AAPL:NASDAQ")],
            vec![Cell::from("AOT:BKK"), Cell::from("SCBSET")],
        ];
        wb.write_range(&A1Range::parse("config!A1:C3").unwrap(), &seed).await.unwrap();

        let cfg = wb.read_config().await.unwrap();
        assert_eq!(cfg.stocks, ["PTT:BKK", "AOT:BKK"]);
        assert_eq!(cfg.funds, ["SCBSET"]);
        assert_eq!(cfg.summary_tickers, ["AAPL:NASDAQ"]);
    }
}
