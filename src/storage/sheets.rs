// src/storage/sheets.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{A1Range, Cell, ConfigColumns, ConfigSource, SyncTarget};
use crate::utils::error::SyncError;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_TIMEOUT_SECS: u64 = 60;

/// Response of `spreadsheets.values.get`
/// Example: {"range": "config!A1:C20", "majorDimension": "ROWS", "values": [["PTT:BKK", "K-FIXED"]]}
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    range: String,
    #[serde(rename = "majorDimension")]
    major_dimension: &'static str,
    values: &'a [Vec<Cell>],
}

/// Google Sheets API v4 client for one spreadsheet, authorized with an OAuth bearer token.
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
    config_sheet: String,
    skip_header: bool,
}

impl SheetsClient {
    pub fn new(
        spreadsheet_id: &str,
        access_token: &str,
        config_sheet: &str,
        skip_header: bool,
    ) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SHEETS_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: access_token.to_string(),
            config_sheet: config_sheet.to_string(),
            skip_header,
        })
    }

    /// `{base}/{spreadsheet_id}/values/{range}{suffix}` with the range percent-encoded.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SyncError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| SyncError::InvalidRange(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidRange(self.base_url.clone()))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, range: &str) -> Result<String, SyncError> {
        let response = request
            .bearer_auth(&self.access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }
        tracing::error!("Sheets API returned {} for {}", status, range);
        Err(classify_status(status, range, body))
    }
}

fn classify_status(status: StatusCode, range: &str, body: String) -> SyncError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Auth(body),
        StatusCode::NOT_FOUND => SyncError::SheetNotFound(range.to_string()),
        // A missing worksheet is reported as an unparseable range
        StatusCode::BAD_REQUEST if body.contains("Unable to parse range") => SyncError::SheetNotFound(range.to_string()),
        _ => SyncError::Http { status, body },
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ConfigSource for SheetsClient {
    async fn read_config(&mut self) -> Result<ConfigColumns, SyncError> {
        let range = format!("{}!A:C", self.config_sheet);
        let url = self.values_url(&range, "")?;
        tracing::debug!("Reading config from {}", range);

        let body = self.send(self.http.get(url), &range).await?;
        let parsed: ValueRange = serde_json::from_str(&body).map_err(|e| SyncError::Serialization(e.to_string()))?;
        let grid: Vec<Vec<String>> = parsed
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Ok(ConfigColumns::from_grid(&grid, self.skip_header))
    }
}

#[async_trait]
impl SyncTarget for SheetsClient {
    async fn clear_range(&mut self, range: &A1Range) -> Result<(), SyncError> {
        let a1 = range.to_string();
        let url = self.values_url(&a1, ":clear")?;
        self.send(self.http.post(url).json(&serde_json::json!({})), &a1).await?;
        tracing::debug!("Cleared {}", a1);
        Ok(())
    }

    async fn write_range(&mut self, range: &A1Range, rows: &[Vec<Cell>]) -> Result<(), SyncError> {
        range.check_fits(rows)?;
        let a1 = range.to_string();
        let mut url = self.values_url(&a1, "")?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = UpdateRequest { range: a1.clone(), major_dimension: "ROWS", values: rows };
        self.send(self.http.put(url).json(&body), &a1).await?;
        tracing::debug!("Wrote {} rows to {}", rows.len(), a1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_url_encodes_sheet_names() {
        let client = SheetsClient::new("sheet-id", "token", "config", false).unwrap();
        let url = client.values_url("'My Sheet'!A2:C1000", ":clear").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/'My%20Sheet'!A2:C1000:clear"
        );
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "r", "denied".into()),
            SyncError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "th_data!A2:C1000", "Unable to parse range: th_data!A2:C1000".into()),
            SyncError::SheetNotFound(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "r", "oops".into()),
            SyncError::Http { .. }
        ));
    }

    #[test]
    fn update_body_keeps_numbers_numeric() {
        let rows = vec![vec![Cell::from("PTT"), Cell::from(35.75)]];
        let body = UpdateRequest { range: "th_data!A2:C1000".into(), major_dimension: "ROWS", values: &rows };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["values"][0][1], serde_json::json!(35.75));
        assert_eq!(json["majorDimension"], "ROWS");
    }
}
