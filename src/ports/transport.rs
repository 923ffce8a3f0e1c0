use eyre::Result;
use tokio::net::TcpListener;

use crate::{ports::router::BoxRouter, utils::graceful_shutdown::ShutdownToken};

/// Transport defines the port for binding a network server engine to a
/// [`Router`](crate::ports::router::Router).
///
/// Bindings must behave identically on the wire for the same input; they only
/// differ in the engine that owns the sockets.
pub trait Transport: Send + Sync + 'static {
    /// Short engine name used in logs.
    fn name(&self) -> &'static str;

    /// Replace the router used for subsequent requests.
    ///
    /// Requests already resolved keep the router they started with.
    fn route(&self, router: BoxRouter);

    /// Serve connections accepted on `listener` until `shutdown` fires.
    ///
    /// # Returns
    /// A future that resolves when the server stops or encounters an error
    fn serve(
        &self,
        listener: TcpListener,
        shutdown: ShutdownToken,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
