//! Engine-independent half of every transport binding.
//!
//! A transport only extracts `(path, method, body)` from its connection and
//! writes back whatever [`Switchboard::exchange`] returns. Resolution,
//! invocation, output validation and error mapping all happen here, so two
//! bindings over different engines cannot disagree on the wire.
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::http::{Method, StatusCode};
use bytes::Bytes;
use serde::de::IgnoredAny;

use crate::{
    core::{
        error::{DispatchError, DispatchResult},
        status::StatusTable,
    },
    ports::router::BoxRouter,
};

/// Status and body to write back, always produced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Holds the live router and the status table shared by a transport.
pub struct Switchboard {
    router: ArcSwapOption<BoxRouter>,
    statuses: StatusTable,
}

impl Switchboard {
    /// Create a switchboard with no router bound yet.
    pub fn new(statuses: StatusTable) -> Self {
        Self {
            router: ArcSwapOption::empty(),
            statuses,
        }
    }

    /// Atomically replace the router used for requests that arrive from now on.
    pub fn route(&self, router: BoxRouter) {
        self.router.store(Some(Arc::new(router)));
        tracing::info!("Router swapped");
    }

    pub fn is_routed(&self) -> bool {
        self.router.load().is_some()
    }

    pub fn statuses(&self) -> &StatusTable {
        &self.statuses
    }

    /// Run one request through resolve, invoke and validate, and turn the
    /// outcome into a reply.
    pub fn exchange(&self, path: &str, method: &Method, body: Bytes) -> Reply {
        match self.execute(path, method, body) {
            Ok((status, body)) => Reply { status, body },
            Err(err) => self.reply_error(&err),
        }
    }

    /// Reply for an error raised outside the router, such as an unreadable body.
    pub fn reply_error(&self, err: &DispatchError) -> Reply {
        tracing::debug!("Request failed: {}", err);
        let body = serde_json::to_vec(&err.to_envelope())
            .map(Bytes::from)
            .unwrap_or_else(|_| Bytes::from_static(br#"{"message":"Internal Error"}"#));
        Reply {
            status: self.statuses.status_for(err),
            body,
        }
    }

    fn execute(
        &self,
        path: &str,
        method: &Method,
        body: Bytes,
    ) -> DispatchResult<(StatusCode, Bytes)> {
        let router = self.router.load_full().ok_or_else(|| {
            tracing::warn!("Request to {} arrived before any router was bound", path);
            DispatchError::NoHandler
        })?;

        let resolved = router.resolve(path, method)?;
        tracing::debug!("Resolved {} {} to {}", method, path, resolved.action);

        let output = resolved.endpoint.receive(body)?;
        if let Err(e) = serde_json::from_slice::<IgnoredAny>(&output) {
            tracing::error!(
                "Endpoint for {} {} returned malformed JSON: {}",
                method,
                path,
                e
            );
            return Err(DispatchError::Internal);
        }

        Ok((resolved.action.success_status(), output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::action::Action, ports::endpoint::Resolved};

    fn echo_router(path: &str, method: &Method) -> DispatchResult<Resolved> {
        match (path, method.as_str()) {
            ("/echo", "POST") => Ok(Resolved::new(Action::Create, |body: Bytes| Ok(body))),
            ("/echo", _) => Err(DispatchError::BadMethod),
            ("/broken", _) => Ok(Resolved::new(Action::List, |_body: Bytes| {
                Ok(Bytes::from_static(b"eggplant"))
            })),
            ("/missing", _) => Ok(Resolved::new(Action::GetOne, |_body: Bytes| {
                Err(DispatchError::NotFound)
            })),
            _ => Err(DispatchError::BadRequest),
        }
    }

    fn routed() -> Switchboard {
        let switchboard = Switchboard::new(StatusTable::default());
        switchboard.route(Box::new(echo_router));
        switchboard
    }

    #[test]
    fn test_unrouted_switchboard_reports_no_handler() {
        let switchboard = Switchboard::new(StatusTable::default());
        assert!(!switchboard.is_routed());

        let reply = switchboard.exchange("/echo", &Method::GET, Bytes::new());
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            reply.body,
            Bytes::from_static(br#"{"message":"No handler for that route and method"}"#)
        );
    }

    #[test]
    fn test_success_passes_body_verbatim() {
        let reply = routed().exchange("/echo", &Method::POST, Bytes::from_static(b"{\"a\": 1}"));
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body, Bytes::from_static(b"{\"a\": 1}"));
    }

    #[test]
    fn test_malformed_output_is_internal() {
        let reply = routed().exchange("/broken", &Method::GET, Bytes::new());
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            reply.body,
            Bytes::from_static(br#"{"message":"Internal Error"}"#)
        );
    }

    #[test]
    fn test_resolution_and_execution_errors_share_rendering() {
        let switchboard = routed();

        let reply = switchboard.exchange("/echo", &Method::PUT, Bytes::new());
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);

        let reply = switchboard.exchange("/missing", &Method::GET, Bytes::new());
        assert_eq!(reply.status, StatusCode::NOT_FOUND);

        let reply = switchboard.exchange("/nowhere", &Method::GET, Bytes::new());
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body, Bytes::from_static(br#"{"message":"Bad Request"}"#));
    }

    #[test]
    fn test_route_swaps_live() {
        let switchboard = routed();
        switchboard.route(Box::new(
            |_path: &str, _method: &Method| -> DispatchResult<Resolved> {
                Err(DispatchError::NotFound)
            },
        ));

        let reply = switchboard.exchange("/echo", &Method::POST, Bytes::new());
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }
}
