use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanDeckError {
    #[error("Audit not found: {0}")]
    AuditNotFound(String),

    #[error("Identifier already in use: {0}")]
    DuplicateId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScanDeckError {
    /// Stable machine-readable code reported across the request boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanDeckError::AuditNotFound(_) => "NOT_FOUND",
            ScanDeckError::DuplicateId(_) => "DUPLICATE_ID",
            ScanDeckError::InvalidInput(_) => "INVALID_INPUT",
            ScanDeckError::InvalidFilter(_) => "INVALID_FILTER",
            ScanDeckError::InvalidRequest(_) => "INVALID_REQUEST",
            ScanDeckError::Config(_) => "CONFIG",
            ScanDeckError::Io(_) => "IO",
            ScanDeckError::Json(_) => "JSON",
            ScanDeckError::Toml(_) => "TOML",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanDeckError>;
