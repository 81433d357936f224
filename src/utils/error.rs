// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Network request to automation driver failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Automation driver runtime not found: {0}")]
    RuntimeNotFound(String),

    #[error("Browser session could not be created: {0}")]
    SessionCreation(String),

    #[error("Driver returned '{error}': {message}")]
    Protocol { error: String, message: String },

    #[error("Invalid class selector '{0}'")]
    InvalidSelector(String),

    #[error("Element reference is stale: {0}")]
    StaleElement(String),

    #[error("Operation not supported by this browser: {0}")]
    Unsupported(&'static str),

    #[error("Page handle is not valid: {0}")]
    NotFound(String),

    #[error("Failed to parse driver response: {0}")]
    Parse(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("Invalid numeric format: '{0}'")]
    InvalidNumericFormat(String),
}

#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error("UI control not found for role {0}")]
    ControlNotFound(String),

    #[error("No year-selector controls exposed after activating the annual view")]
    NoYearColumns,

    #[error("Row count changed between year columns: expected {expected}, found {found} (column {column})")]
    RowCountMismatch { expected: usize, found: usize, column: usize },

    #[error("Row {row} label changed between year columns: '{expected}' vs '{found}'")]
    RowLabelMismatch { row: usize, expected: String, found: String },

    #[error("None of the year columns could be populated")]
    NoColumnsPopulated,

    #[error("Browser interaction failed: {0}")]
    Driver(#[from] DriverError),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network request to spreadsheet failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Spreadsheet authentication failed: {0}")]
    Auth(String),

    #[error("Spreadsheet or worksheet not found: {0}")]
    SheetNotFound(String),

    #[error("Spreadsheet HTTP error {status}: {body}")]
    Http { status: reqwest::StatusCode, body: String },

    #[error("Invalid A1 range: {0}")]
    InvalidRange(String),

    #[error("{rows}x{cols} block does not fit range {range}")]
    RangeOverflow { range: String, rows: usize, cols: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Browser session failed: {0}")]
    Driver(#[from] DriverError),

    #[error("Spreadsheet sync failed: {0}")]
    Sync(#[from] SyncError),
}

impl AppError {
    /// Human-readable instructions shown alongside the error, if any apply.
    pub fn remediation(&self) -> Option<String> {
        match self {
            AppError::Driver(DriverError::SessionCreation(_)) => Some(
                "The automation driver does not match the installed browser.\n\
                 Re-download the matching ChromeDriver from https://chromedriver.chromium.org/downloads\n\
                 and replace the executable passed via --driver-path (default endpoint: WEBDRIVER_URL)."
                    .to_string(),
            ),
            AppError::Driver(DriverError::RuntimeNotFound(_)) => Some(
                "ChromeDriver is not running or could not be found.\n\
                 Start it (e.g. `chromedriver --port=9515`) or pass its executable with --driver-path."
                    .to_string(),
            ),
            AppError::Sync(SyncError::Auth(_)) => Some(
                "Provide a valid OAuth access token with the spreadsheets scope via GOOGLE_ACCESS_TOKEN."
                    .to_string(),
            ),
            _ => None,
        }
    }
}
