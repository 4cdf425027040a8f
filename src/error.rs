use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Transport Errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus {
        status: u16,
        url: String,
    },

    #[error("No streamed price for {0}")]
    StreamUnavailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Stream not connected")]
    NotConnected,

    #[error("Connection closed")]
    ConnectionClosed,

    // Parse Errors
    #[error("Field {field} missing in {provider} response")]
    MissingField {
        provider: &'static str,
        field: String,
    },

    #[error("Non-numeric value: {0}")]
    InvalidNumber(String),

    #[error("No price pattern matched in {0}")]
    PatternNotFound(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("Event deserialization failed: {0}")]
    DeserializationError(String),

    // Configuration Errors
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Invalid source descriptor {descriptor:?}: {reason}")]
    InvalidDescriptor {
        descriptor: String,
        reason: String,
    },

    #[error("Provider {provider} cannot resolve {requested}")]
    UnsupportedIdentifier {
        provider: &'static str,
        requested: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Storage Errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // API Errors
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used by orchestrators for logging and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Transient,
    Parse,
    Config,
    Storage,
    Api,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transient => "transient",
            FailureKind::Parse => "parse",
            FailureKind::Config => "config",
            FailureKind::Storage => "storage",
            FailureKind::Api => "api",
        }
    }
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Transport(_)
            | Error::HttpStatus { .. }
            | Error::StreamUnavailable(_)
            | Error::WebSocket(_)
            | Error::NotConnected
            | Error::ConnectionClosed => FailureKind::Transient,

            Error::MissingField { .. }
            | Error::InvalidNumber(_)
            | Error::PatternNotFound(_)
            | Error::InvalidPrice(_)
            | Error::DeserializationError(_) => FailureKind::Parse,

            Error::MissingCredential(_)
            | Error::InvalidDescriptor { .. }
            | Error::UnsupportedIdentifier { .. }
            | Error::ConfigError(_) => FailureKind::Config,

            Error::IoError(_) | Error::SerializationError(_) => FailureKind::Storage,

            Error::Unauthorized
            | Error::UnknownGroup(_)
            | Error::BadRequest(_)
            | Error::TaskFailed(_) => FailureKind::Api,
        }
    }

    /// Only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Transient
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => Error::Transport(err.to_string()),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_failures() {
        assert_eq!(Error::Transport("reset".into()).kind(), FailureKind::Transient);
        assert_eq!(Error::InvalidPrice(0.0).kind(), FailureKind::Parse);
        assert_eq!(Error::MissingCredential("goldapi_key").kind(), FailureKind::Config);
        assert!(Error::HttpStatus { status: 503, url: "x".into() }.is_retryable());
        assert!(!Error::PatternNotFound("page".into()).is_retryable());
    }
}
