use crate::schema::RecordKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unknown request type: {0}")]
    UnknownRequestType(String),

    #[error("Missing request object for {0}")]
    MissingRequestObject(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to fetch {kind} records: {message}")]
    SourceFetch { kind: RecordKind, message: String },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LedgerError {
    pub fn fetch(kind: RecordKind, message: impl Into<String>) -> Self {
        Self::SourceFetch {
            kind,
            message: message.into(),
        }
    }

    /// Errors caused by the caller's request rather than by a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownRequestType(_)
                | Self::MissingRequestObject(_)
                | Self::InvalidRequest(_)
                | Self::DateError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(LedgerError::UnknownRequestType("Foo".to_string()).is_client_error());
        assert!(LedgerError::MissingRequestObject("Bar".to_string()).is_client_error());
        assert!(!LedgerError::fetch(RecordKind::Payment, "connection reset").is_client_error());
    }

    #[test]
    fn test_fetch_error_message_names_source() {
        let err = LedgerError::fetch(RecordKind::OrderDetail, "timeout");
        assert_eq!(err.to_string(), "Failed to fetch OrderDetail records: timeout");
    }
}
