use async_trait::async_trait;
use serde_json::Value;

use crate::core::{context::RequestContext, error::DispatchResult};

/// Outcome of a service operation.
///
/// `Ok(None)` means the operation produced nothing at all, which the
/// dispatcher reports as `NoHandler`.
pub type ServiceResult = DispatchResult<Option<Value>>;

/// Service defines the port for the five CRUD operations behind a prefix.
///
/// Every operation has a default that produces nothing, so a service only
/// implements the actions it supports. The instance is shared by every
/// concurrent request and must guard its own mutable state.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// `GET {prefix}`
    async fn get_all(&self, _ctx: &RequestContext) -> ServiceResult {
        Ok(None)
    }

    /// `GET {prefix}/{id}`
    async fn get_one(&self, _ctx: &RequestContext) -> ServiceResult {
        Ok(None)
    }

    /// `POST {prefix}`
    async fn create(&self, _ctx: &RequestContext) -> ServiceResult {
        Ok(None)
    }

    /// `PATCH {prefix}/{id}`
    async fn update(&self, _ctx: &RequestContext) -> ServiceResult {
        Ok(None)
    }

    /// `DELETE {prefix}/{id}`
    async fn delete(&self, _ctx: &RequestContext) -> ServiceResult {
        Ok(None)
    }
}
