//! Ports: the capabilities the dispatch core is written against.
pub mod config_provider;
pub mod endpoint;
pub mod router;
pub mod service;
pub mod transport;

pub use endpoint::{BoxEndpoint, Endpoint, Resolved};
pub use router::{BoxRouter, Router};
pub use service::{Service, ServiceResult};
pub use transport::Transport;
