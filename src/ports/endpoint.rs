use bytes::Bytes;

use crate::core::{action::Action, error::DispatchResult};

/// A resolved, single-use unit of work bound to one request.
///
/// Receiving a body consumes the endpoint, so it cannot be invoked twice.
/// It yields either a serialized JSON body or an error, never both.
pub trait Endpoint: Send + 'static {
    fn receive(self: Box<Self>, body: Bytes) -> DispatchResult<Bytes>;
}

impl<F> Endpoint for F
where
    F: FnOnce(Bytes) -> DispatchResult<Bytes> + Send + 'static,
{
    fn receive(self: Box<Self>, body: Bytes) -> DispatchResult<Bytes> {
        (*self)(body)
    }
}

/// Owned endpoint as handed out by a router.
pub type BoxEndpoint = Box<dyn Endpoint>;

/// Outcome of a successful resolution: the endpoint plus the action it
/// performs, which decides the success status.
pub struct Resolved {
    pub action: Action,
    pub endpoint: BoxEndpoint,
}

impl Resolved {
    /// Wraps a closure as the endpoint for `action`.
    pub fn new<F>(action: Action, endpoint: F) -> Self
    where
        F: FnOnce(Bytes) -> DispatchResult<Bytes> + Send + 'static,
    {
        Self {
            action,
            endpoint: Box::new(endpoint),
        }
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}
