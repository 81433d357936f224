// src/utils/html_debug.rs
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use crate::utils::error::AppError;

/// Saves a page snapshot to a file with the given byte ranges highlighted
pub fn save_debug_html(html: &str, path: &Path, highlights: &[(usize, usize, &str)]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;

    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    debug_html.push_str(".highlight-class { background-color: #FFFF00; outline: 1px solid #FFA500; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    // Overlapping ranges are dropped; the earliest start wins
    let mut last_pos = 0;
    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| h.0);

    for (start, end, label) in sorted_highlights {
        if start < last_pos || end > html.len() {
            continue;
        }
        debug_html.push_str(&html[last_pos..start]);
        debug_html.push_str(&format!(
            "<span class=\"highlight-class\" title=\"Position: {}-{}, Class: {}\">",
            start, end, label
        ));
        debug_html.push_str(&html[start..end]);
        debug_html.push_str("</span>");
        last_pos = end;
    }

    if last_pos < html.len() {
        debug_html.push_str(&html[last_pos..]);
    }
    debug_html.push_str("\n</body>\n</html>");

    file.write_all(debug_html.as_bytes())?;

    tracing::info!("Saved debug HTML to {}", path.display());
    Ok(())
}

/// Writes a snapshot of `page_source` for `key` under `dir`, highlighting every
/// occurrence of the class identifiers the scraper was looking for.
/// Missing highlights in the output usually mean the page changed its class names.
pub fn snapshot_page(dir: &Path, key: &str, stage: &str, page_source: &str, classes: &[&str]) -> Result<PathBuf, AppError> {
    let mut highlights = Vec::new();
    for class in classes {
        // Compound identifiers are searched part by part
        for part in class.split('.').filter(|p| !p.is_empty()) {
            for (start, matched) in page_source.match_indices(part) {
                highlights.push((start, start + matched.len(), *class));
            }
        }
    }

    let file_name = format!("{}_{}.html", sanitize_file_stem(key), stage);
    let path = dir.join(file_name);
    save_debug_html(page_source, &path, &highlights)?;
    Ok(path)
}

fn sanitize_file_stem(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_highlights_class_occurrences() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<div class="roXhBd">Revenue</div><div class="kHAtIb">Name</div>"#;

        let path = snapshot_page(dir.path(), "PTT:BKK", "annual", html, &["roXhBd"]).unwrap();

        assert!(path.ends_with("PTT_BKK_annual.html"));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.matches("highlight-class\" title").count(), 1);
        assert!(written.contains("kHAtIb"));
    }
}
