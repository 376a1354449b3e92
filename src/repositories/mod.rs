use std::collections::HashSet;

use async_trait::async_trait;

use crate::entities::{FeedCursor, Post, PostId, User, UserId};

pub mod mock;
pub mod mongo;

pub type Result<T> = ::std::result::Result<T, RepositoryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Add,
    Remove,
}

#[async_trait]
pub trait UserRepository {
    async fn insert(&self, item: User) -> Result<bool>;

    async fn find(&self, id: UserId) -> Result<User>;
    async fn finds(&self, query: UserQuery) -> Result<Vec<User>>;

    /// Atomic set mutation on one document. Returns whether the set changed.
    async fn modify_friend(&self, id: UserId, friend: UserId, op: SetOp) -> Result<bool>;

    /// Applies `op` to both documents as one unit. Fails with `NotFound`
    /// without writing anything when either side is missing.
    async fn modify_friendship(&self, id: UserId, friend: UserId, op: SetOp) -> Result<()>;
}

#[async_trait]
pub trait PostRepository {
    async fn insert(&self, item: Post) -> Result<bool>;

    async fn find(&self, id: PostId) -> Result<Post>;
    /// Most recent first, ties broken by descending id.
    async fn finds(&self, query: PostQuery) -> Result<Vec<Post>>;

    /// Removes `user_id` from the like set if present, inserts it otherwise,
    /// in a single per-document update.
    async fn toggle_like(&self, id: PostId, user_id: UserId) -> Result<Post>;
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub ids: Option<HashSet<UserId>>,
    pub friend_of: Option<UserId>,
}

impl UserQuery {
    pub fn ids(ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
            ..Default::default()
        }
    }

    pub(crate) fn matches(&self, user: &User) -> bool {
        let UserQuery { ids, friend_of } = self;

        ids.as_ref().map(|s| s.contains(&user.id)).unwrap_or(true)
            && friend_of.map(|f| user.is_friend(f)).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub author: Option<UserId>,
    pub after: Option<FeedCursor>,
    pub limit: Option<u32>,
}

impl PostQuery {
    pub(crate) fn matches(&self, post: &Post) -> bool {
        self.author.map(|a| post.author == a).unwrap_or(true)
            && self.after.map(|c| c.is_before(post)).unwrap_or(true)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("cannot find object.")]
    NotFound,

    #[error("expected unique object, found non-unique objects (matched: {matched})")]
    NoUnique { matched: u32 },

    #[error("storage unavailable: {0}")]
    Unavailable(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

/// Recency order used by every post listing.
pub(crate) fn sort_recent_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| (b.created, b.id).cmp(&(a.created, a.id)));
}
