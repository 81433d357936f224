// src/extractors/numbers.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::storage::Cell;
use crate::utils::error::NormalizeError;

// Plain decimal literal: optional sign, digits with optional fraction, or a bare fraction
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$").expect("Failed to compile DECIMAL_RE")
});

fn magnitude(suffix: char) -> Option<i32> {
    match suffix {
        'T' => Some(12),
        'B' => Some(9),
        'M' => Some(6),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<f64> {
    if DECIMAL_RE.is_match(s) {
        s.parse::<f64>().ok()
    } else {
        None
    }
}

/// Expands a trailing `T`/`B`/`M` magnitude into a number (`"2.5B"` -> `2.5e9`).
/// Anything without one of those suffixes is returned unchanged as text.
pub fn normalize(raw: &str) -> Result<Cell, NormalizeError> {
    let Some(suffix) = raw.chars().last() else {
        return Ok(Cell::Text(String::new()));
    };
    let Some(exponent) = magnitude(suffix) else {
        return Ok(Cell::Text(raw.to_string()));
    };
    let prefix = &raw[..raw.len() - suffix.len_utf8()];
    parse_decimal(prefix)
        .map(|n| Cell::Number(n * 10f64.powi(exponent)))
        .ok_or_else(|| NormalizeError::InvalidNumericFormat(raw.to_string()))
}

/// `normalize`, with an unparseable prefix falling back to the original text.
pub fn normalize_or_raw(raw: &str) -> Cell {
    normalize(raw).unwrap_or_else(|e| {
        tracing::debug!("{}; keeping the raw value", e);
        Cell::Text(raw.to_string())
    })
}

/// Price text to a number: leading currency symbols and thousands separators
/// are dropped, then magnitude suffixes expanded. Text that still isn't numeric
/// is kept as-is.
pub fn parse_price(raw: &str) -> Cell {
    let stripped: String = raw
        .trim()
        .trim_start_matches(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.')))
        .chars()
        .filter(|c| *c != ',')
        .collect();

    match normalize(&stripped) {
        Ok(Cell::Text(text)) => parse_decimal(&text).map(Cell::Number).unwrap_or_else(|| Cell::Text(raw.to_string())),
        Ok(number) => number,
        Err(e) => {
            tracing::debug!("{}; keeping the raw price", e);
            Cell::Text(raw.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_magnitude_suffixes() {
        assert_eq!(normalize("2.5B").unwrap(), Cell::Number(2.5e9));
        assert_eq!(normalize("917T").unwrap(), Cell::Number(9.17e14));
        assert_eq!(normalize("12M").unwrap(), Cell::Number(12e6));
        assert_eq!(normalize("-3.25M").unwrap(), Cell::Number(-3.25e6));
    }

    #[test]
    fn passes_through_unsuffixed_values() {
        assert_eq!(normalize("42").unwrap(), Cell::Text("42".into()));
        assert_eq!(normalize("1.2X").unwrap(), Cell::Text("1.2X".into()));
        assert_eq!(normalize("—").unwrap(), Cell::Text("—".into()));
        assert_eq!(normalize("").unwrap(), Cell::Text(String::new()));
    }

    #[test]
    fn rejects_non_decimal_prefixes() {
        for bad in ["abcB", "1e3M", "2+2B", "B", "1,000M", "__import__('os')T"] {
            assert_eq!(
                normalize(bad),
                Err(NormalizeError::InvalidNumericFormat(bad.to_string())),
                "{} should be rejected",
                bad
            );
        }
        assert_eq!(normalize_or_raw("abcB"), Cell::Text("abcB".into()));
    }

    #[test]
    fn prices_drop_currency_and_separators() {
        assert_eq!(parse_price("฿35.75"), Cell::Number(35.75));
        assert_eq!(parse_price("฿1,234.50"), Cell::Number(1234.5));
        assert_eq!(parse_price("$2.5B"), Cell::Number(2.5e9));
        assert_eq!(parse_price("11.2031"), Cell::Number(11.2031));
        assert_eq!(parse_price("N/A"), Cell::Text("N/A".into()));
    }
}
