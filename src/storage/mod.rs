// src/storage/mod.rs
pub mod local;
pub mod range;
pub mod sheets;

#[cfg(test)]
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::SyncError;
pub use range::{A1Range, CellRef};

/// One spreadsheet cell value: numbers are written as numbers, everything else as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// The three lookup-key columns of the persisted config table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigColumns {
    pub stocks: Vec<String>,
    pub funds: Vec<String>,
    pub summary_tickers: Vec<String>,
}

impl ConfigColumns {
    /// Column 0 = stocks, 1 = funds, 2 = five-year-summary tickers.
    /// Blank cells and rows shorter than a column are skipped.
    pub fn from_grid(grid: &[Vec<String>], skip_header: bool) -> Self {
        let body = if skip_header { grid.get(1..).unwrap_or(&[]) } else { grid };
        let column = |i: usize| -> Vec<String> {
            body.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .map(str::to_string)
                .collect()
        };
        Self {
            stocks: column(0),
            funds: column(1),
            summary_tickers: column(2),
        }
    }
}

/// Reads the persisted lookup-key configuration.
#[async_trait]
pub trait ConfigSource: Send {
    async fn read_config(&mut self) -> Result<ConfigColumns, SyncError>;
}

/// Spreadsheet the normalized rows are written to. Addresses are always explicit;
/// nothing relies on the target resizing itself.
#[async_trait]
pub trait SyncTarget: Send {
    async fn clear_range(&mut self, range: &A1Range) -> Result<(), SyncError>;

    async fn write_range(&mut self, range: &A1Range, rows: &[Vec<Cell>]) -> Result<(), SyncError>;
}
