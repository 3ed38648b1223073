use std::fmt;

/// Failures at the upstream boundary. Missing or malformed fields inside a
/// well-formed payload are never errors; they fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub enum NSEError {
    /// Network failure, timeout or non-success status
    Unreachable(String),
    /// Body that is not JSON or does not have the expected shape
    InvalidData(String),
}

impl NSEError {
    /// HTTP status the API answers with
    pub fn status_code(&self) -> u16 {
        match self {
            NSEError::Unreachable(_) => 503,
            NSEError::InvalidData(_) => 502,
        }
    }
}

impl fmt::Display for NSEError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NSEError::Unreachable(msg) => write!(f, "NSE service unavailable: {}", msg),
            NSEError::InvalidData(msg) => write!(f, "Invalid upstream data: {}", msg),
        }
    }
}

impl std::error::Error for NSEError {}

impl From<reqwest::Error> for NSEError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NSEError::InvalidData(err.to_string())
        } else {
            NSEError::Unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NSEError {
    fn from(err: serde_json::Error) -> Self {
        NSEError::InvalidData(err.to_string())
    }
}
