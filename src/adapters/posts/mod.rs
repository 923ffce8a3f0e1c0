//! Example post collection, reachable through both dispatch paths.
pub mod model;
pub mod router;
pub mod service;
pub mod store;

pub use model::{Post, PostFields, sample_posts};
pub use router::PostsRouter;
pub use service::PostService;
pub use store::PostStore;
