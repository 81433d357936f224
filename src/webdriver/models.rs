// src/webdriver/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every WebDriver response wraps its payload in `{"value": ...}`
#[derive(Debug, Deserialize)]
pub struct WireResponse<T> {
    pub value: T,
}

/// Error payload returned with non-2xx statuses
/// Example: {"value": {"error": "session not created", "message": "...", "stacktrace": "..."}}
#[derive(Debug, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NewSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub capabilities: Value,
}

/// Element references are keyed by the W3C element identifier
#[derive(Debug, Deserialize)]
pub struct ElementReference {
    #[serde(rename = "element-6066-11e4-a52f-4d7c6e8d6a4e")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DriverStatus {
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LocatorRequest<'a> {
    pub using: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NavigateRequest<'a> {
    pub url: &'a str,
}

/// Session timeouts in milliseconds. `implicit` bounds how long element
/// lookups wait for the page to render.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Timeouts {
    pub implicit: u64,
    #[serde(rename = "pageLoad")]
    pub page_load: u64,
}

/// Capabilities for a (optionally headless) Chrome session
pub fn chrome_capabilities(headless: bool) -> Value {
    let mut args = vec!["--disable-gpu", "--window-size=1280,2000"];
    if headless {
        args.push("--headless");
    }
    serde_json::json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_element_list() {
        let body = r#"{"value": [
            {"element-6066-11e4-a52f-4d7c6e8d6a4e": "f.1.e-1"},
            {"element-6066-11e4-a52f-4d7c6e8d6a4e": "f.1.e-2"}
        ]}"#;
        let parsed: WireResponse<Vec<ElementReference>> = serde_json::from_str(body).unwrap();
        let ids: Vec<_> = parsed.value.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["f.1.e-1", "f.1.e-2"]);
    }

    #[test]
    fn parses_session_and_error_payloads() {
        let ok = r#"{"value": {"sessionId": "abc123", "capabilities": {"browserName": "chrome"}}}"#;
        let parsed: WireResponse<NewSession> = serde_json::from_str(ok).unwrap();
        assert_eq!(parsed.value.session_id, "abc123");

        let err = r#"{"value": {"error": "session not created", "message": "This version of ChromeDriver only supports Chrome version 90", "stacktrace": ""}}"#;
        let parsed: WireResponse<WireError> = serde_json::from_str(err).unwrap();
        assert_eq!(parsed.value.error, "session not created");
        assert!(parsed.value.message.contains("Chrome version 90"));
    }

    #[test]
    fn headless_flag_controls_chrome_args() {
        let caps = chrome_capabilities(true);
        let args = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"];
        assert!(args.as_array().unwrap().iter().any(|a| a == "--headless"));

        let caps = chrome_capabilities(false);
        let args = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"];
        assert!(!args.as_array().unwrap().iter().any(|a| a == "--headless"));
    }
}
