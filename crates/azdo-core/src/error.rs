//! Error types for azdo-mcp.

use thiserror::Error;

/// Message reported when an error carries no text of its own.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Main error type for azdo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication failed (401/403)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Azure DevOps returned a non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Response could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Arguments are well-typed but jointly insufficient
    #[error("{0}")]
    Validation(String),

    /// Link type name has no relation type mapping
    #[error("Unknown link type: {0}")]
    UnknownLinkType(String),

    /// Unlink matched zero relations
    #[error("No matching relations found for link type '{link_type}'{}", url_suffix(.url))]
    NoMatchingRelation {
        link_type: String,
        url: Option<String>,
    },

    /// Call succeeded but produced nothing
    #[error("{0}")]
    EmptyResult(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

fn url_suffix(url: &Option<String>) -> String {
    match url {
        Some(url) => format!(" and URL '{}'", url),
        None => String::new(),
    }
}

impl Error {
    /// Map an HTTP status code and response body to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Auth(format!("{} - {}", status, message)),
            404 => Error::NotFound(format!("{} - {}", status, message)),
            _ => Error::Api { status, message },
        }
    }

    /// Message suitable for a tool error envelope.
    ///
    /// Falls back to [`UNKNOWN_ERROR`] when the error renders as blank.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        }
    }
}

/// Result type alias for azdo operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            Error::from_status(401, "nope".into()),
            Error::Auth(_)
        ));
        assert!(matches!(
            Error::from_status(404, "gone".into()),
            Error::NotFound(_)
        ));
        let err = Error::from_status(404, "Work item 9 does not exist".into());
        assert_eq!(err.to_string(), "Not found: 404 - Work item 9 does not exist");
        let err = Error::from_status(500, "Internal Server Error".into());
        assert_eq!(err.to_string(), "API error: 500 - Internal Server Error");
    }

    #[test]
    fn test_no_matching_relation_message() {
        let err = Error::NoMatchingRelation {
            link_type: "related".into(),
            url: None,
        };
        assert_eq!(
            err.to_string(),
            "No matching relations found for link type 'related'"
        );

        let err = Error::NoMatchingRelation {
            link_type: "related".into(),
            url: Some("http://test.com/2".into()),
        };
        assert_eq!(
            err.to_string(),
            "No matching relations found for link type 'related' and URL 'http://test.com/2'"
        );
    }

    #[test]
    fn test_user_message_falls_back_for_blank_errors() {
        let err = Error::Other(anyhow::anyhow!(""));
        assert_eq!(err.user_message(), UNKNOWN_ERROR);

        let err = Error::Http("connection refused".into());
        assert_eq!(err.user_message(), "HTTP error: connection refused");
    }
}
