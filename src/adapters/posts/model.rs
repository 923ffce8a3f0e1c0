use serde::{Deserialize, Serialize};

/// A record of the example collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub likes: u64,
}

/// Client-supplied fields of a post.
///
/// Any `id` in the payload is ignored: ids are assigned on create and never
/// change on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub likes: Option<u64>,
}

impl PostFields {
    /// New post with id `id`; missing fields take their zero values.
    pub fn into_post(self, id: u64) -> Post {
        Post {
            id,
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            likes: self.likes.unwrap_or_default(),
        }
    }

    /// Overwrite the fields of `post` that are present here.
    pub fn merge_into(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(likes) = self.likes {
            post.likes = likes;
        }
    }
}

/// The three sample posts the store starts with.
pub fn sample_posts() -> Vec<Post> {
    [(1, 3), (2, 2), (3, 1)]
        .into_iter()
        .map(|(id, likes)| Post {
            id,
            title: format!("Post {id}"),
            content: format!("Content of Post {id}"),
            likes,
        })
        .collect()
}
