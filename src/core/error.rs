//! Error taxonomy shared by every dispatch path.
//!
//! Errors are compared by variant, never by message text. The status code a
//! variant maps to is decided by [`StatusTable`](crate::core::status::StatusTable)
//! so the dispatcher and both transport bindings agree on it.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while resolving or executing a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DispatchError {
    /// The addressed record does not exist.
    #[error("Object Not Found")]
    NotFound,

    /// Something went wrong on our side, including an endpoint emitting a
    /// body that is not well-formed JSON.
    #[error("Internal Error")]
    Internal,

    /// The path matched but the method is not bound to any action.
    #[error("Method Not Allowed")]
    BadMethod,

    /// The service produced neither a result nor an error.
    #[error("No handler for that route and method")]
    NoHandler,

    /// The path could not be resolved, or the request was otherwise unusable.
    #[error("Bad Request")]
    BadRequest,

    /// The request body could not be decoded.
    #[error("Bad JSON")]
    BadJson,

    /// Service-level validation failure carrying its own message.
    #[error("{0}")]
    Invalid(String),
}

impl DispatchError {
    /// Returns the kind of this error, used to look up its status code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NotFound => ErrorKind::NotFound,
            DispatchError::Internal => ErrorKind::Internal,
            DispatchError::BadMethod => ErrorKind::BadMethod,
            DispatchError::NoHandler => ErrorKind::NoHandler,
            DispatchError::BadRequest | DispatchError::BadJson | DispatchError::Invalid(_) => {
                ErrorKind::Validation
            }
        }
    }

    /// Wraps the error message in the wire envelope.
    pub fn to_envelope(&self) -> ErrorResponse {
        ErrorResponse {
            message: self.to_string(),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        tracing::debug!("JSON decoding failed: {}", e);
        DispatchError::BadJson
    }
}

/// Status-relevant classification of a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Internal,
    BadMethod,
    NoHandler,
    Validation,
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Textual representation of the error.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_wire_contract() {
        assert_eq!(DispatchError::NotFound.to_string(), "Object Not Found");
        assert_eq!(DispatchError::Internal.to_string(), "Internal Error");
        assert_eq!(DispatchError::BadMethod.to_string(), "Method Not Allowed");
        assert_eq!(DispatchError::BadRequest.to_string(), "Bad Request");
        assert_eq!(DispatchError::BadJson.to_string(), "Bad JSON");
        assert_eq!(
            DispatchError::Invalid("title is required".to_string()).to_string(),
            "title is required"
        );
    }

    #[test]
    fn test_validation_variants_share_kind() {
        assert_eq!(DispatchError::BadRequest.kind(), ErrorKind::Validation);
        assert_eq!(DispatchError::BadJson.kind(), ErrorKind::Validation);
        assert_eq!(
            DispatchError::Invalid(String::new()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(DispatchError::NoHandler.kind(), ErrorKind::NoHandler);
    }

    #[test]
    fn test_envelope_serialization() {
        let body = serde_json::to_string(&DispatchError::NotFound.to_envelope()).unwrap();
        assert_eq!(body, r#"{"message":"Object Not Found"}"#);
    }

    #[test]
    fn test_json_error_becomes_bad_json() {
        let err = serde_json::from_str::<serde_json::Value>("eggplant").unwrap_err();
        assert_eq!(DispatchError::from(err), DispatchError::BadJson);
    }
}
