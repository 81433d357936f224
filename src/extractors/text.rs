// src/extractors/text.rs
use crate::utils::error::DriverError;
use crate::webdriver::Browser;

/// Trimmed, non-empty texts of every element of each class on the current page.
/// Output is class-major, then document order. A class matching nothing
/// contributes nothing; the result length is not fixed.
pub async fn extract_texts<B: Browser + ?Sized>(
    browser: &mut B,
    classes: &[&str],
) -> Result<Vec<String>, DriverError> {
    let mut texts = Vec::new();
    for class in classes {
        let elements = browser.find_by_class(class).await?;
        tracing::trace!("Class '{}' matched {} elements", class, elements.len());
        for element in &elements {
            let text = browser.element_text(element).await?;
            let text = text.trim();
            if !text.is_empty() {
                texts.push(text.to_string());
            }
        }
    }
    Ok(texts)
}
