/// Failure to retrieve an operator page or payload
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// The fetched payload did not have the shape an adapter expects
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("expected structure not found: {0}")]
    StructureNotFound(String),

    #[error("marker not found: {0}")]
    MarkerNotFound(String),

    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("missing field: {0}")]
    MissingField(String),
}

impl From<serde_json::Error> for ExtractionError {
    fn from(err: serde_json::Error) -> Self {
        ExtractionError::Json(err.to_string())
    }
}

/// A single record violates field constraints
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("plan name is empty")]
    EmptyName,

    #[error("plan name is longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },

    #[error("{field} must be a finite, non-negative volume")]
    InvalidVolume { field: &'static str },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("unknown operator code: {0}")]
    UnknownOperatorCode(String),
}
