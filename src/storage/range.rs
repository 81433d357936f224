// src/storage/range.rs
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::storage::Cell;
use crate::utils::error::SyncError;

static A1_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:'((?:[^']|'')+)'|([^!']+))!([A-Za-z]{1,3})([1-9][0-9]*):([A-Za-z]{1,3})([1-9][0-9]*)$")
        .expect("Failed to compile A1_RE")
});

/// One cell position: zero-based column, one-based row (as in `B7`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// A rectangular worksheet range in A1 notation, e.g. `th_data!A2:C1000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: String,
    pub start: CellRef,
    pub end: CellRef,
}

impl A1Range {
    pub fn parse(s: &str) -> Result<Self, SyncError> {
        let caps = A1_RE
            .captures(s.trim())
            .ok_or_else(|| SyncError::InvalidRange(s.to_string()))?;

        let sheet = match (caps.get(1), caps.get(2)) {
            (Some(quoted), _) => quoted.as_str().replace("''", "'"),
            (None, Some(bare)) => bare.as_str().to_string(),
            (None, None) => return Err(SyncError::InvalidRange(s.to_string())),
        };
        let row = |i: usize| {
            caps[i]
                .parse::<u32>()
                .map_err(|_| SyncError::InvalidRange(s.to_string()))
        };
        let start = CellRef::new(column_index(&caps[3]), row(4)?);
        let end = CellRef::new(column_index(&caps[5]), row(6)?);

        if end.col < start.col || end.row < start.row {
            return Err(SyncError::InvalidRange(s.to_string()));
        }
        Ok(Self { sheet, start, end })
    }

    /// Range covering a `rows` x `cols` block whose top-left cell is `top_left`.
    pub fn block(sheet: &str, top_left: CellRef, rows: usize, cols: usize) -> Self {
        let rows = rows.max(1) as u32;
        let cols = cols.max(1) as u32;
        Self {
            sheet: sheet.to_string(),
            start: top_left,
            end: CellRef::new(top_left.col + cols - 1, top_left.row + rows - 1),
        }
    }

    pub fn rows(&self) -> usize {
        (self.end.row - self.start.row + 1) as usize
    }

    pub fn cols(&self) -> usize {
        (self.end.col - self.start.col + 1) as usize
    }

    /// Fails if `data` has more rows or a wider row than the range holds.
    pub fn check_fits(&self, data: &[Vec<Cell>]) -> Result<(), SyncError> {
        let widest = data.iter().map(Vec::len).max().unwrap_or(0);
        if data.len() > self.rows() || widest > self.cols() {
            return Err(SyncError::RangeOverflow {
                range: self.to_string(),
                rows: data.len(),
                cols: widest,
            });
        }
        Ok(())
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let needs_quotes = !self.sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if needs_quotes {
            write!(f, "'{}'", self.sheet.replace('\'', "''"))?;
        } else {
            write!(f, "{}", self.sheet)?;
        }
        write!(
            f,
            "!{}{}:{}{}",
            column_letters(self.start.col),
            self.start.row,
            column_letters(self.end.col),
            self.end.row
        )
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn column_index(letters: &str) -> u32 {
    letters
        .bytes()
        .map(|b| (b.to_ascii_uppercase() - b'A') as u32 + 1)
        .fold(0, |acc, d| acc * 26 + d)
        - 1
}
