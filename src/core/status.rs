//! The one error-kind to status-code table.
//!
//! Both transport bindings and the dispatcher render errors through
//! [`StatusTable::render`], so the same error always yields the same status
//! regardless of which engine served the request.
use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::core::error::{DispatchError, ErrorKind};

/// Content type of every response body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Mapping from [`ErrorKind`] to HTTP status code.
///
/// Loaded from the `[status]` configuration section. Defaults use 405 for
/// both "wrong method" kinds and 400 as the catch-all for validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTable {
    pub not_found: u16,
    pub internal: u16,
    pub bad_method: u16,
    pub no_handler: u16,
    /// Status for validation errors and anything else without its own entry.
    pub fallback: u16,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self {
            not_found: 404,
            internal: 500,
            bad_method: 405,
            no_handler: 405,
            fallback: 400,
        }
    }
}

impl StatusTable {
    /// Table matching the historical wire behaviour, where a bad method on a
    /// matched path answered 403.
    pub fn legacy() -> Self {
        Self {
            bad_method: 403,
            ..Self::default()
        }
    }

    /// Raw code configured for `kind`.
    pub fn code_for(&self, kind: ErrorKind) -> u16 {
        match kind {
            ErrorKind::NotFound => self.not_found,
            ErrorKind::Internal => self.internal,
            ErrorKind::BadMethod => self.bad_method,
            ErrorKind::NoHandler => self.no_handler,
            ErrorKind::Validation => self.fallback,
        }
    }

    /// Status code for `err`.
    pub fn status_for(&self, err: &DispatchError) -> StatusCode {
        StatusCode::from_u16(self.code_for(err.kind())).unwrap_or_else(|_| {
            tracing::error!(
                "Configured status {} for {:?} is not a valid HTTP status",
                self.code_for(err.kind()),
                err.kind()
            );
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }

    /// All configured codes, labelled, for validation and diagnostics.
    pub fn entries(&self) -> [(&'static str, u16); 5] {
        [
            ("not_found", self.not_found),
            ("internal", self.internal),
            ("bad_method", self.bad_method),
            ("no_handler", self.no_handler),
            ("fallback", self.fallback),
        ]
    }

    /// Renders `err` as a complete JSON error response.
    pub fn render(&self, err: &DispatchError) -> Response<Body> {
        let body = serde_json::to_vec(&err.to_envelope()).unwrap_or_else(|e| {
            tracing::error!("Failed to encode error envelope: {}", e);
            br#"{"message":"Internal Error"}"#.to_vec()
        });
        json_response(self.status_for(err), body)
    }
}

/// Builds a response with `status`, the JSON content type and `body`.
pub fn json_response(status: StatusCode, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}
