use std::sync::Arc;

use axum::http::Method;
use bytes::Bytes;
use regex::Regex;
use serde::Serialize;

use crate::{
    adapters::posts::{model::PostFields, store::PostStore},
    core::{
        action::{Action, PathShape},
        error::{DispatchError, DispatchResult},
    },
    ports::{endpoint::Resolved, router::Router},
};

/// [`Router`] resolving `{prefix}` and `{prefix}/{id}` onto a shared
/// [`PostStore`].
///
/// Building the endpoint is cheap and happens per request; the store it acts
/// on lives as long as the router's owner keeps it.
pub struct PostsRouter {
    store: Arc<PostStore>,
    collection: Regex,
    item: Regex,
}

impl PostsRouter {
    pub fn new(prefix: &str, store: Arc<PostStore>) -> Result<Self, regex::Error> {
        let prefix = regex::escape(prefix);
        Ok(Self {
            store,
            collection: Regex::new(&format!("^{prefix}/?$"))?,
            item: Regex::new(&format!(r"^{prefix}/(\d+)/?$"))?,
        })
    }

    fn collection_endpoint(&self, method: &Method) -> DispatchResult<Resolved> {
        let store = self.store.clone();
        match Action::from_method(PathShape::Collection, method) {
            Some(Action::List) => Ok(Resolved::new(Action::List, move |_body| {
                encode(&store.all()?)
            })),
            Some(Action::Create) => Ok(Resolved::new(Action::Create, move |body| {
                let fields: PostFields = serde_json::from_slice(&body)?;
                encode(&store.create(fields)?)
            })),
            _ => Err(DispatchError::BadMethod),
        }
    }

    fn item_endpoint(&self, id: u64, method: &Method) -> DispatchResult<Resolved> {
        let store = self.store.clone();
        match Action::from_method(PathShape::Item, method) {
            Some(Action::GetOne) => Ok(Resolved::new(Action::GetOne, move |_body| {
                encode(&store.get(id)?)
            })),
            Some(Action::Update) => Ok(Resolved::new(Action::Update, move |body| {
                let fields: PostFields = serde_json::from_slice(&body)?;
                encode(&store.update(id, fields)?)
            })),
            Some(Action::Delete) => Ok(Resolved::new(Action::Delete, move |_body| {
                encode(&store.delete(id)?)
            })),
            _ => Err(DispatchError::BadMethod),
        }
    }
}

impl Router for PostsRouter {
    fn resolve(&self, path: &str, method: &Method) -> DispatchResult<Resolved> {
        if self.collection.is_match(path) {
            return self.collection_endpoint(method);
        }
        if let Some(captures) = self.item.captures(path) {
            let id = captures[1]
                .parse::<u64>()
                .map_err(|_| DispatchError::BadRequest)?;
            return self.item_endpoint(id, method);
        }
        Err(DispatchError::BadRequest)
    }
}

fn encode<T: Serialize>(value: &T) -> DispatchResult<Bytes> {
    serde_json::to_vec(value).map(Bytes::from).map_err(|e| {
        tracing::error!("Failed to encode post result: {}", e);
        DispatchError::Internal
    })
}
