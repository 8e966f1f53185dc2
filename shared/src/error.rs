use thiserror::Error;

/// Failure of a single REST call made by the data fetch layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("fetch error: {0}")]
    Network(String),
    #[error("HTTP {status}")]
    Http { status: u16 },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{message}")]
    Api { message: String },
}

impl FetchError {
    /// Whether showing the previous data alongside this error still makes sense.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status } => *status >= 500 || *status == 429,
            Self::Parse(_) | Self::Api { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("player tag is empty")]
    Empty,
    #[error("player tag contains invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("player tag is too short")]
    TooShort,
    #[error("player tag is too long")]
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("{required} permission is required to export the roster")]
    PermissionDenied { required: &'static str },
    #[error("there are no rows to export")]
    NothingToExport,
}

/// Browser storage refused a read or write (private mode, quota, disabled).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("local storage is unavailable")]
    Unavailable,
    #[error("local storage write failed: {0}")]
    Write(String),
    #[error("couldn't encode stored value: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::FetchError;

    #[test]
    fn fetch_error_messages_match_panel_copy() {
        assert_eq!(FetchError::Http { status: 502 }.to_string(), "HTTP 502");
        assert_eq!(
            FetchError::Network("offline".into()).to_string(),
            "fetch error: offline"
        );
    }

    #[test]
    fn only_server_side_and_network_failures_are_transient() {
        assert!(FetchError::Network("reset".into()).is_transient());
        assert!(FetchError::Http { status: 503 }.is_transient());
        assert!(FetchError::Http { status: 429 }.is_transient());
        assert!(!FetchError::Http { status: 404 }.is_transient());
        assert!(!FetchError::Parse("eof".into()).is_transient());
    }
}
