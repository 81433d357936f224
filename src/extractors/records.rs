// src/extractors/records.rs
use std::collections::HashSet;

use crate::config::profiles::RecordProfile;
use crate::config::ScrapeOptions;
use crate::extractors::numbers::parse_price;
use crate::extractors::text::extract_texts;
use crate::extractors::{save_snapshot, SkippedKey};
use crate::storage::Cell;
use crate::utils::error::DriverError;
use crate::webdriver::{close_quietly, is_session_fault, Browser, SessionFactory};

/// Name, price, timestamp
pub const RECORD_FIELDS: usize = 3;

/// How the timestamp field is shortened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTrim {
    /// Keep the first n whitespace-separated tokens
    Tokens(usize),
    /// Drop the first n characters, then trim surrounding whitespace
    SkipChars(usize),
}

impl DateTrim {
    pub fn apply(&self, raw: &str) -> String {
        match *self {
            DateTrim::Tokens(n) => raw.split_whitespace().take(n).collect::<Vec<_>>().join(" "),
            DateTrim::SkipChars(n) => raw.chars().skip(n).collect::<String>().trim().to_string(),
        }
    }
}

/// One scraped row: display name, price, timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub name: String,
    pub price: Cell,
    pub timestamp: String,
}

impl FlatRecord {
    /// Post-processes raw extracted fields. `None` if fewer than three fields were found;
    /// extra fields beyond the third are dropped.
    pub fn from_fields(fields: &[String], date_trim: DateTrim) -> Option<Self> {
        match fields {
            [name, price, timestamp, ..] => Some(Self {
                name: name.clone(),
                price: parse_price(price),
                timestamp: date_trim.apply(timestamp),
            }),
            _ => None,
        }
    }

    pub fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.name.clone()),
            self.price.clone(),
            Cell::Text(self.timestamp.clone()),
        ]
    }
}

/// Records of one scrape, sorted by name, plus the keys that produced no record.
#[derive(Debug, Default)]
pub struct RecordSet {
    pub records: Vec<FlatRecord>,
    pub skipped: Vec<SkippedKey>,
}

impl RecordSet {
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        self.records.iter().map(FlatRecord::to_row).collect()
    }
}

/// Stable ascending sort by name; duplicate names stay as separate rows.
pub fn sort_records(records: &mut [FlatRecord]) {
    records.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Visits one page per distinct key with a single session and returns the
/// post-processed, name-sorted records. Keys whose page yields too few fields,
/// or whose page cannot be loaded, are skipped and reported.
pub async fn scrape_records<F: SessionFactory>(
    factory: &F,
    keys: &[String],
    profile: &RecordProfile,
    options: &ScrapeOptions,
) -> Result<RecordSet, DriverError> {
    // Config order, so equal names keep a fixed relative order after the stable sort
    let mut seen = HashSet::new();
    let unique: Vec<&str> = keys.iter().map(String::as_str).filter(|k| seen.insert(*k)).collect();
    if unique.is_empty() {
        tracing::info!("No {} configured; nothing to scrape", profile.kind);
        return Ok(RecordSet::default());
    }

    let mut session = factory.open().await?;
    let collected = collect_fields(&mut session, &unique, profile, options).await;
    close_quietly(&mut session).await;
    let (raw, mut skipped) = collected?;

    let mut records = Vec::with_capacity(raw.len());
    for (key, fields) in raw {
        match FlatRecord::from_fields(&fields, profile.date_trim) {
            Some(record) => records.push(record),
            None => skipped.push(SkippedKey::new(key, format!("expected {} fields, found {}", RECORD_FIELDS, fields.len()))),
        }
    }
    sort_records(&mut records);

    tracing::info!("Scraped {} {} ({} skipped)", records.len(), profile.kind, skipped.len());
    Ok(RecordSet { records, skipped })
}

type RawFields = Vec<(String, Vec<String>)>;

async fn collect_fields<B: Browser>(
    browser: &mut B,
    keys: &[&str],
    profile: &RecordProfile,
    options: &ScrapeOptions,
) -> Result<(RawFields, Vec<SkippedKey>), DriverError> {
    let mut raw = Vec::with_capacity(keys.len());
    let mut skipped = Vec::new();

    for key in keys {
        let url = profile.url_for(key);
        tracing::info!("Scraping {} {}", profile.kind, key);

        let fields = match browser.navigate(&url).await {
            Ok(()) => extract_texts(browser, profile.classes).await,
            Err(e) => Err(e),
        };
        let fields = match fields {
            Ok(fields) => fields,
            Err(e) if is_session_fault(&e) => return Err(e),
            Err(e) => {
                tracing::warn!("Skipping {} {}: {}", profile.kind, key, e);
                skipped.push(SkippedKey::new(key.to_string(), e.to_string()));
                continue;
            }
        };

        if fields.len() < RECORD_FIELDS {
            tracing::warn!("Skipping {} {}: page yielded {} of {} fields", profile.kind, key, fields.len(), RECORD_FIELDS);
            save_snapshot(browser, options, key, profile.kind, profile.classes).await;
        }
        raw.push((key.to_string(), fields));
    }
    Ok((raw, skipped))
}
