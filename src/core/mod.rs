pub mod action;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod status;
pub mod switchboard;

pub use action::Action;
pub use context::RequestContext;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult, ErrorResponse};
pub use status::StatusTable;
pub use switchboard::{Reply, Switchboard};
