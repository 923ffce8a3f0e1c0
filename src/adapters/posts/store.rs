//! Lock-guarded in-memory post collection.
//!
//! One [`RwLock`] covers the whole collection: reads run in parallel, every
//! mutation is exclusive. The store is created once and shared by every
//! request; tests get isolation by building their own store from the seed.
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    adapters::posts::model::{Post, PostFields, sample_posts},
    core::error::{DispatchError, DispatchResult},
};

#[derive(Debug, Default)]
pub struct PostStore {
    posts: RwLock<Vec<Post>>,
}

impl PostStore {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }

    /// Store holding the sample posts.
    pub fn seeded() -> Self {
        Self::new(sample_posts())
    }

    fn read(&self) -> DispatchResult<RwLockReadGuard<'_, Vec<Post>>> {
        self.posts.read().map_err(|_| {
            tracing::error!("Post store lock poisoned");
            DispatchError::Internal
        })
    }

    fn write(&self) -> DispatchResult<RwLockWriteGuard<'_, Vec<Post>>> {
        self.posts.write().map_err(|_| {
            tracing::error!("Post store lock poisoned");
            DispatchError::Internal
        })
    }

    pub fn len(&self) -> DispatchResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> DispatchResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Every post, in insertion order.
    pub fn all(&self) -> DispatchResult<Vec<Post>> {
        Ok(self.read()?.clone())
    }

    pub fn get(&self, id: u64) -> DispatchResult<Post> {
        self.read()?
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .ok_or(DispatchError::NotFound)
    }

    /// Append a post whose id is the current count plus one.
    ///
    /// Ids are not checked against previously deleted ones, so a create after
    /// a delete can reuse an id still held by another record.
    pub fn create(&self, fields: PostFields) -> DispatchResult<Post> {
        let mut posts = self.write()?;
        let post = fields.into_post(posts.len() as u64 + 1);
        posts.push(post.clone());
        tracing::debug!("Created post {}", post.id);
        Ok(post)
    }

    /// Merge `fields` into post `id`, keeping its id.
    pub fn update(&self, id: u64, fields: PostFields) -> DispatchResult<Post> {
        let mut posts = self.write()?;
        let post = posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(DispatchError::NotFound)?;
        fields.merge_into(post);
        Ok(post.clone())
    }

    /// Remove post `id` and return it.
    pub fn delete(&self, id: u64) -> DispatchResult<Post> {
        let mut posts = self.write()?;
        let index = posts
            .iter()
            .position(|post| post.id == id)
            .ok_or(DispatchError::NotFound)?;
        tracing::debug!("Deleted post {}", id);
        Ok(posts.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn fields(title: &str) -> PostFields {
        PostFields {
            title: Some(title.to_string()),
            ..PostFields::default()
        }
    }

    #[test]
    fn test_create_assigns_count_plus_one() {
        let store = PostStore::seeded();
        let post = store.create(fields("foo")).unwrap();
        assert_eq!(post.id, 4);
        assert_eq!(store.get(4).unwrap(), post);
        assert_eq!(store.len().unwrap(), 4);
    }

    #[test]
    fn test_get_missing() {
        let store = PostStore::seeded();
        assert_eq!(store.get(5).unwrap_err(), DispatchError::NotFound);
    }

    #[test]
    fn test_update_missing_leaves_store_alone() {
        let store = PostStore::seeded();
        assert_eq!(
            store.update(9, fields("foo")).unwrap_err(),
            DispatchError::NotFound
        );
        assert_eq!(store.all().unwrap(), sample_posts());
    }

    #[test]
    fn test_delete_twice() {
        let store = PostStore::seeded();
        assert_eq!(store.delete(2).unwrap().id, 2);
        assert_eq!(store.delete(2).unwrap_err(), DispatchError::NotFound);
        let ids: Vec<u64> = store.all().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_create_after_delete_reuses_count() {
        let store = PostStore::seeded();
        store.delete(1).unwrap();
        assert_eq!(store.create(fields("again")).unwrap().id, 3);
    }

    #[test]
    fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(PostStore::default());
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                std::thread::spawn(move || store.create(fields(&n.to_string())).unwrap().id)
            })
            .collect();

        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert!(!store.is_empty().unwrap());
    }
}
