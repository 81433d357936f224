// src/config/profiles.rs
// Page layouts of the scraped sites. Class identifiers are the sites' generated
// CSS class names and change without notice; `--debug` snapshots show which still match.
use crate::extractors::records::DateTrim;

/// Where and how one kind of flat record (name, price, timestamp) is scraped.
#[derive(Debug, Clone)]
pub struct RecordProfile {
    pub kind: &'static str,
    /// `{key}` is replaced by the lookup key
    pub url_template: &'static str,
    /// One class per record field, in field order
    pub classes: &'static [&'static str],
    pub date_trim: DateTrim,
    /// Target cells on the records worksheet
    pub range: &'static str,
}

impl RecordProfile {
    pub fn url_for(&self, key: &str) -> String {
        self.url_template.replace("{key}", key)
    }
}

/// Thai stock quotes from Google Finance
pub const STOCKS: RecordProfile = RecordProfile {
    kind: "stocks",
    url_template: "https://www.google.com/finance/quote/{key}",
    classes: &["kHAtIb", "YMlKec.fxKbKc", "ygUjEc"],
    date_trim: DateTrim::Tokens(4),
    range: super::STOCKS_RANGE,
};

/// Mutual fund NAVs from thaifundstoday.com
pub const FUNDS: RecordProfile = RecordProfile {
    kind: "funds",
    url_template: "http://www.thaifundstoday.com/en/funds/{key}",
    classes: &["span7", "unchanged", "date"],
    date_trim: DateTrim::SkipChars(6),
    range: super::FUNDS_RANGE,
};

/// Google Finance financial-statement panel driven by the five-year summary.
#[derive(Debug, Clone)]
pub struct SummaryProfile {
    pub url_template: &'static str,
    /// Class shared by the Quarterly/Annual toggles and the year buttons
    pub control_class: &'static str,
    /// Position of the Annual toggle among `control_class` elements
    pub annual_index: usize,
    /// Label of the Annual toggle for label-based lookup
    pub annual_label: &'static str,
    /// Rows of the statement table; the first one is the header
    pub row_class: &'static str,
}

impl SummaryProfile {
    pub fn url_for(&self, key: &str) -> String {
        self.url_template.replace("{key}", key)
    }
}

pub const FIVE_YEAR_SUMMARY: SummaryProfile = SummaryProfile {
    url_template: "https://www.google.com/finance/quote/{key}",
    control_class: "VfPpkd-vQzf8d",
    annual_index: 3,
    annual_label: "Annual",
    row_class: "roXhBd",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_substitute_the_key() {
        assert_eq!(STOCKS.url_for("PTT:BKK"), "https://www.google.com/finance/quote/PTT:BKK");
        assert_eq!(FUNDS.url_for("K-FIXED"), "http://www.thaifundstoday.com/en/funds/K-FIXED");
        assert_eq!(
            FIVE_YEAR_SUMMARY.url_for("AAPL:NASDAQ"),
            "https://www.google.com/finance/quote/AAPL:NASDAQ"
        );
    }
}
