// src/storage/memory.rs
// Test workbook that records every call in order.
use async_trait::async_trait;

use crate::storage::{A1Range, Cell, ConfigColumns, ConfigSource, SyncTarget};
use crate::utils::error::SyncError;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clear(String),
    Write(String, Vec<Vec<Cell>>),
}

#[derive(Debug, Default)]
pub struct MemoryWorkbook {
    pub config: ConfigColumns,
    pub calls: Vec<Call>,
    pub deny_writes: bool,
}

impl MemoryWorkbook {
    pub fn with_config(config: ConfigColumns) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn writes(&self) -> Vec<(&str, &Vec<Vec<Cell>>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(range, rows) => Some((range.as_str(), rows)),
                Call::Clear(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl ConfigSource for MemoryWorkbook {
    async fn read_config(&mut self) -> Result<ConfigColumns, SyncError> {
        Ok(self.config.clone())
    }
}

#[async_trait]
impl SyncTarget for MemoryWorkbook {
    async fn clear_range(&mut self, range: &A1Range) -> Result<(), SyncError> {
        self.calls.push(Call::Clear(range.to_string()));
        Ok(())
    }

    async fn write_range(&mut self, range: &A1Range, rows: &[Vec<Cell>]) -> Result<(), SyncError> {
        if self.deny_writes {
            return Err(SyncError::Auth("token expired".to_string()));
        }
        range.check_fits(rows)?;
        self.calls.push(Call::Write(range.to_string(), rows.to_vec()));
        Ok(())
    }
}
