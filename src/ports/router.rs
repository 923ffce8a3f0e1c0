use axum::http::Method;

use crate::{core::error::DispatchResult, ports::endpoint::Resolved};

/// Router defines the port for turning a `(path, method)` pair into work.
///
/// Implementations must be total: every input yields either an endpoint or
/// an error. A router is shared by all in-flight requests of a transport, so
/// it must be safe to call concurrently.
pub trait Router: Send + Sync + 'static {
    /// Resolve the request line to an endpoint.
    ///
    /// # Errors
    /// * [`DispatchError::BadMethod`](crate::core::error::DispatchError::BadMethod)
    ///   when the path matches but the method is not bound
    /// * [`DispatchError::BadRequest`](crate::core::error::DispatchError::BadRequest)
    ///   when the path cannot be resolved at all
    fn resolve(&self, path: &str, method: &Method) -> DispatchResult<Resolved>;
}

impl<F> Router for F
where
    F: Fn(&str, &Method) -> DispatchResult<Resolved> + Send + Sync + 'static,
{
    fn resolve(&self, path: &str, method: &Method) -> DispatchResult<Resolved> {
        self(path, method)
    }
}

/// Shared, type-erased router.
pub type BoxRouter = Box<dyn Router>;
