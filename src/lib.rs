//! crudwire - a transport-agnostic CRUD request dispatcher.
//!
//! A resource is exposed over HTTP by implementing one of two small
//! capabilities and handing it to a server engine:
//!
//! - a [`Service`] with the five CRUD operations, bound under a route prefix by
//!   the [`Dispatcher`] (per-action axum routes), or
//! - a [`Router`] that turns `(path, method)` into a single-use
//!   [`Endpoint`](ports::Endpoint), served by any [`Transport`]. Two transports
//!   ship with the crate: [`AxumTransport`] and [`HyperTransport`]. Both hand
//!   the request line to the same [`Switchboard`](core::Switchboard), so they
//!   behave identically on the wire.
//!
//! Every response carries the JSON content type. Errors are a closed set of
//! [`DispatchError`] kinds rendered as `{"message": ...}` with the status from
//! a single shared [`StatusTable`].
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use crudwire::{AxumTransport, GracefulShutdown, PostStore, PostsRouter, StatusTable, Transport};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let store = Arc::new(PostStore::seeded());
//! let transport = AxumTransport::new(StatusTable::default());
//! transport.route(Box::new(PostsRouter::new("/posts", store)?));
//!
//! let shutdown = GracefulShutdown::new();
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! transport.serve(listener, shutdown.shutdown_token()).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! Capabilities live in `ports`, engine-independent logic in `core`, and
//! engine bindings plus the example post collection in `adapters`.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{AxumTransport, FileConfigProvider, HyperTransport, PostService, PostStore, PostsRouter},
    core::{Action, DispatchError, DispatchResult, Dispatcher, RequestContext, StatusTable},
    ports::{Router, Service, Transport},
    utils::{GracefulShutdown, ShutdownToken},
};
