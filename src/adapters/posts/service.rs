use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    adapters::posts::{model::PostFields, store::PostStore},
    core::{context::RequestContext, error::DispatchError},
    ports::service::{Service, ServiceResult},
};

/// [`Service`] over a shared [`PostStore`], for use behind a
/// [`Dispatcher`](crate::core::Dispatcher).
#[derive(Clone)]
pub struct PostService {
    store: Arc<PostStore>,
}

impl PostService {
    pub fn new(store: Arc<PostStore>) -> Self {
        Self { store }
    }
}

fn found<T: Serialize>(value: T) -> ServiceResult {
    serde_json::to_value(value).map(Some).map_err(|e| {
        tracing::error!("Failed to encode post result: {}", e);
        DispatchError::Internal
    })
}

#[async_trait]
impl Service for PostService {
    async fn get_all(&self, _ctx: &RequestContext) -> ServiceResult {
        found(self.store.all()?)
    }

    async fn get_one(&self, ctx: &RequestContext) -> ServiceResult {
        found(self.store.get(ctx.id())?)
    }

    async fn create(&self, ctx: &RequestContext) -> ServiceResult {
        let fields: PostFields = ctx.body_into()?;
        found(self.store.create(fields)?)
    }

    async fn update(&self, ctx: &RequestContext) -> ServiceResult {
        let fields: PostFields = ctx.body_into()?;
        found(self.store.update(ctx.id(), fields)?)
    }

    async fn delete(&self, ctx: &RequestContext) -> ServiceResult {
        found(self.store.delete(ctx.id())?)
    }
}
