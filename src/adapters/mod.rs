pub mod axum_transport;
pub mod config_providers;
pub mod hyper_transport;
pub mod posts;

/// Re-export commonly used types from adapters
pub use axum_transport::AxumTransport;
pub use config_providers::FileConfigProvider;
pub use hyper_transport::HyperTransport;
pub use posts::{PostService, PostStore, PostsRouter};
