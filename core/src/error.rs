//! Error types for the REST client.
//!
//! # Design
//! Argument errors are raised before anything touches the network. Any
//! non-2xx response lands in `Http` with the status code and the full body
//! text, so callers always have the server's diagnostic payload.

use thiserror::Error;

/// Errors returned by `RestApiClient` and its collaborators.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required argument was blank or missing. Carries the argument name.
    #[error("invalid argument: {0} is required")]
    InvalidArgument(&'static str),

    /// A URI was empty or could not be resolved against the base address.
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// A header name or value that is not valid on the wire.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A media type string that maps to no supported format.
    #[error("media type '{0}' is not supported")]
    UnsupportedMediaType(String),

    /// The server answered with a status outside the 2xx range.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request model could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be decoded into the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// A verb was invoked after the client released its transport.
    #[error("client has been disposed")]
    Disposed,

    /// The transport handle could not be built.
    #[error("failed to build transport: {0}")]
    Build(String),
}

impl ClientError {
    /// Status code carried by an HTTP fault.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() {
            ClientError::Connection(err.to_string())
        } else if err.is_builder() {
            ClientError::Build(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_fault_exposes_status() {
        let err = ClientError::Http {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 404: not found");
    }

    #[test]
    fn non_http_errors_have_no_status() {
        assert_eq!(ClientError::Disposed.status(), None);
        assert!(!ClientError::InvalidArgument("request_uri").is_not_found());
    }

    #[test]
    fn invalid_argument_names_the_argument() {
        assert_eq!(
            ClientError::InvalidArgument("access_token").to_string(),
            "invalid argument: access_token is required"
        );
    }
}
