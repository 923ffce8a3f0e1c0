//! Per-request context handed to [`Service`](crate::ports::service::Service)
//! operations.
//!
//! A context is built once per inbound request, before any service code runs,
//! and carries everything the service needs: the numeric id from the path,
//! the decoded body and the action that was matched. It never outlives the
//! request it was built for.
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::core::{
    action::Action,
    error::{DispatchError, DispatchResult},
};

/// Parsed identity of a single request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: u64,
    action: Action,
    body: Option<HashMap<String, String>>,
    document: Option<Map<String, Value>>,
}

impl RequestContext {
    /// Builds the context for a request to `path` with raw `body`.
    ///
    /// Construction never fails. An id that cannot be parsed becomes 0, and a
    /// body that is empty or not a JSON object is recorded as absent.
    pub fn new(action: Action, path: &str, body: &[u8]) -> Self {
        let document = parse_document(body);
        Self {
            id: parse_id(path).unwrap_or(0),
            action,
            body: document.as_ref().map(flatten),
            document,
        }
    }

    /// Numeric id from the trailing path segment, 0 when absent.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Flat string view of the body, `None` when the request had no usable body.
    pub fn body(&self) -> Option<&HashMap<String, String>> {
        self.body.as_ref()
    }

    /// Decodes the body into `T`, keeping the original JSON value types.
    pub fn body_into<T: DeserializeOwned>(&self) -> DispatchResult<T> {
        let document = self.document.clone().ok_or(DispatchError::BadJson)?;
        Ok(serde_json::from_value(Value::Object(document))?)
    }
}

/// Parses the trailing segment of `path` as an id, tolerating one trailing
/// slash.
pub fn parse_id(path: &str) -> Option<u64> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let segment = trimmed.rsplit('/').next()?;
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn parse_document(body: &[u8]) -> Option<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            tracing::debug!("Request body is JSON but not an object: {}", other);
            None
        }
        Err(e) => {
            tracing::debug!("Request body is not valid JSON: {}", e);
            None
        }
    }
}

fn flatten(document: &Map<String, Value>) -> HashMap<String, String> {
    document
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}
