use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{FeedCursor, Post, PostId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub image_ref: Option<String>,
    /// Every key maps to `true`; absence means "not liked".
    pub likes: BTreeMap<UserId, bool>,
    pub created_at: DateTime<Utc>,
}

impl PostView {
    pub fn like_count(&self) -> usize { self.likes.values().filter(|v| **v).count() }

    pub fn is_liked_by(&self, user: UserId) -> bool {
        self.likes.get(&user).copied().unwrap_or(false)
    }
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author,
            content: post.content,
            image_ref: post.image_ref,
            likes: post.likes.into_iter().map(|u| (u, true)).collect(),
            created_at: post.created,
        }
    }
}

/// One page of a listing. `next` is set when a further page may exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub posts: Vec<PostView>,
    pub next: Option<FeedCursor>,
}

#[test]
fn likes_render_as_true_map() {
    let liker = UserId::generate();
    let post = Post {
        id: PostId::generate(),
        author: UserId::generate(),
        content: "hello".to_string(),
        image_ref: None,
        likes: vec![liker].into_iter().collect(),
        created: Utc::now(),
    };

    let view = PostView::from(post);
    assert_eq!(view.like_count(), 1);
    assert!(view.is_liked_by(liker));

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["likes"][liker.to_string()], true);
    assert_eq!(json["authorId"], view.author_id.to_string());

    let back: PostView = serde_json::from_value(json).unwrap();
    assert_eq!(back, view);
}
