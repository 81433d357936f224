// src/webdriver/client.rs
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::process::{Child, Command};

use crate::utils::error::DriverError;
use crate::webdriver::models::{
    chrome_capabilities, DriverStatus, ElementReference, LocatorRequest, NavigateRequest, NewSession,
    Timeouts, WireError, WireResponse,
};
use crate::webdriver::{class_selector, Browser, Element, SessionFactory};

// How long a freshly spawned driver gets to report ready
const DRIVER_STARTUP_POLLS: u32 = 50;
const DRIVER_STARTUP_POLL_MS: u64 = 100;

/// Opens W3C WebDriver sessions against a running (or spawned) driver.
pub struct WebDriverLauncher {
    http: reqwest::Client,
    base_url: String,
    headless: bool,
    timeouts: Timeouts,
    settle: Duration,
    // Held so the spawned driver lives as long as the launcher
    _process: Option<Child>,
}

impl WebDriverLauncher {
    /// Connects to a driver already listening at `base_url` (e.g. `http://localhost:9515`).
    pub fn new(base_url: &str, headless: bool, timeouts: Timeouts, settle: Duration) -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeouts.page_load.max(timeouts.implicit) + 30_000))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            headless,
            timeouts,
            settle,
            _process: None,
        })
    }

    /// Spawns the driver executable on `port` and waits until it reports ready.
    /// The process is killed when the launcher is dropped.
    pub async fn spawn(
        driver_path: &Path,
        port: u16,
        headless: bool,
        timeouts: Timeouts,
        settle: Duration,
    ) -> Result<Self, DriverError> {
        tracing::info!("Starting automation driver: {} (port {})", driver_path.display(), port);
        let child = Command::new(driver_path)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DriverError::RuntimeNotFound(format!("{}: {}", driver_path.display(), e)))?;

        let mut launcher = Self::new(&format!("http://127.0.0.1:{}", port), headless, timeouts, settle)?;
        launcher._process = Some(child);
        launcher.wait_until_ready().await?;
        Ok(launcher)
    }

    async fn wait_until_ready(&self) -> Result<(), DriverError> {
        let url = format!("{}/status", self.base_url);
        for attempt in 0..DRIVER_STARTUP_POLLS {
            match self.http.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    let status: WireResponse<DriverStatus> = response.json().await?;
                    if status.value.ready {
                        tracing::debug!("Driver ready after {} polls: {}", attempt + 1, status.value.message);
                        return Ok(());
                    }
                }
                Ok(_) | Err(_) => {}
            }
            tokio::time::sleep(Duration::from_millis(DRIVER_STARTUP_POLL_MS)).await;
        }
        Err(DriverError::RuntimeNotFound(format!("driver at {} never became ready", self.base_url)))
    }
}

#[async_trait]
impl SessionFactory for WebDriverLauncher {
    type Session = WebDriverSession;

    async fn open(&self) -> Result<WebDriverSession, DriverError> {
        let url = format!("{}/session", self.base_url);
        tracing::debug!("Creating browser session at {} (headless: {})", url, self.headless);

        let request = self.http.post(&url).json(&chrome_capabilities(self.headless));
        let created: NewSession = match send_wire(request).await {
            Err(DriverError::Network(e)) if e.is_connect() => {
                return Err(DriverError::RuntimeNotFound(format!("no automation driver listening at {}", self.base_url)));
            }
            other => other?,
        };
        tracing::info!(
            "Opened browser session {} ({} {})",
            created.session_id,
            created.capabilities["browserName"].as_str().unwrap_or("unknown"),
            created.capabilities["browserVersion"].as_str().unwrap_or("")
        );

        let session = WebDriverSession {
            http: self.http.clone(),
            session_url: format!("{}/session/{}", self.base_url, created.session_id),
            settle: self.settle,
            closed: false,
        };
        // Bounded render wait for every element lookup in this session
        session.call::<_, Value>(Method::POST, "timeouts", Some(&self.timeouts)).await?;
        Ok(session)
    }
}

/// A live WebDriver session. Deleted on `close`, or best-effort on drop.
pub struct WebDriverSession {
    http: reqwest::Client,
    session_url: String,
    settle: Duration,
    closed: bool,
}

impl WebDriverSession {
    async fn call<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, DriverError> {
        if self.closed {
            return Err(DriverError::NotFound("session already closed".to_string()));
        }
        let url = if path.is_empty() {
            self.session_url.clone()
        } else {
            format!("{}/{}", self.session_url, path)
        };
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        send_wire(request).await
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        tracing::debug!("Navigating to {}", url);
        self.call::<_, Value>(Method::POST, "url", Some(&NavigateRequest { url })).await?;
        Ok(())
    }

    async fn find_by_class(&mut self, class: &str) -> Result<Vec<Element>, DriverError> {
        let selector = class_selector(class)?;
        let found: Vec<ElementReference> = self
            .call(Method::POST, "elements", Some(&LocatorRequest { using: "css selector", value: &selector }))
            .await?;
        Ok(found.into_iter().map(|e| Element::new(e.id)).collect())
    }

    async fn element_text(&mut self, element: &Element) -> Result<String, DriverError> {
        let path = format!("element/{}/text", element.id);
        self.call::<Value, String>(Method::GET, &path, None).await
    }

    async fn click(&mut self, element: &Element) -> Result<(), DriverError> {
        let path = format!("element/{}/click", element.id);
        self.call::<_, Value>(Method::POST, &path, Some(&serde_json::json!({}))).await?;
        // Clicks re-render client side; give the page a moment before the next lookup
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.call::<Value, String>(Method::GET, "source", None).await
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        let result = self.call::<Value, Value>(Method::DELETE, "", None).await;
        self.closed = true;
        tracing::debug!("Closed browser session {}", self.session_url);
        result.map(|_| ())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::warn!("Browser session {} dropped without close; deleting it", self.session_url);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let http = self.http.clone();
            let url = self.session_url.clone();
            handle.spawn(async move {
                let _ = http.delete(url).send().await;
            });
        }
    }
}

/// Sends a WebDriver request and unwraps the `value` payload, mapping W3C error codes.
async fn send_wire<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, DriverError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(classify_error(status, &body));
    }

    let parsed: WireResponse<T> = serde_json::from_str(&body)
        .map_err(|e| DriverError::Parse(format!("{} (body: {})", e, truncate(&body, 200))))?;
    Ok(parsed.value)
}

fn classify_error(status: StatusCode, body: &str) -> DriverError {
    let wire = match serde_json::from_str::<WireResponse<WireError>>(body) {
        Ok(parsed) => parsed.value,
        Err(_) => {
            return DriverError::Protocol {
                error: status.to_string(),
                message: truncate(body, 200).to_string(),
            }
        }
    };
    match wire.error.as_str() {
        "session not created" => DriverError::SessionCreation(wire.message),
        "invalid session id" | "no such window" => DriverError::NotFound(wire.message),
        "stale element reference" | "no such element" => DriverError::StaleElement(wire.message),
        "invalid selector" => DriverError::InvalidSelector(wire.message),
        _ => DriverError::Protocol { error: wire.error, message: wire.message },
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_not_created_maps_to_session_creation() {
        let body = r#"{"value": {"error": "session not created", "message": "This version of ChromeDriver only supports Chrome version 114"}}"#;
        match classify_error(StatusCode::INTERNAL_SERVER_ERROR, body) {
            DriverError::SessionCreation(msg) => assert!(msg.contains("Chrome version 114")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn invalid_session_maps_to_not_found() {
        let body = r#"{"value": {"error": "invalid session id", "message": "session deleted"}}"#;
        assert!(matches!(classify_error(StatusCode::NOT_FOUND, body), DriverError::NotFound(_)));
    }

    #[test]
    fn unknown_body_becomes_protocol_error() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "<html>proxy error</html>");
        match err {
            DriverError::Protocol { error, message } => {
                assert!(error.contains("502"));
                assert!(message.contains("proxy"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_driver_executable_is_runtime_not_found() {
        let timeouts = Timeouts { implicit: 100, page_load: 100 };
        let result = WebDriverLauncher::spawn(
            Path::new("/nonexistent/chromedriver"),
            9599,
            true,
            timeouts,
            Duration::ZERO,
        )
        .await;
        assert!(matches!(result, Err(DriverError::RuntimeNotFound(_))));
    }
}
