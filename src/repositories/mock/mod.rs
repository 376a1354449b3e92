use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    sort_recent_first, PostQuery, PostRepository, RepositoryError, Result, SetOp, UserQuery,
    UserRepository,
};
use crate::entities::{Post, PostId, User, UserId};

mod helpers;

use helpers::{find_mut, find_pair_mut, find_ref, modify_set};

/// Everything lives behind one lock, so each call is atomic with respect to
/// every other call on the same repository.
pub struct InMemoryRepository<T>(Mutex<Vec<T>>);

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self { Self(Mutex::new(vec![])) }
}
impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn insert(&self, item: User) -> Result<bool> {
        let mut guard = self.0.lock().await;

        match find_ref(&guard, |v| v.id == item.id) {
            Ok(_) => return Ok(false),
            Err(RepositoryError::NotFound) => (),
            Err(e) => return Err(e),
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: UserId) -> Result<User> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == id)?.clone())
    }

    async fn finds(&self, query: UserQuery) -> Result<Vec<User>> {
        Ok(self
            .0
            .lock()
            .await
            .iter()
            .filter(|u| query.matches(u))
            .cloned()
            .collect())
    }

    async fn modify_friend(&self, id: UserId, friend: UserId, op: SetOp) -> Result<bool> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |u| u.id == id)?;

        Ok(modify_set(&mut item.friends, friend, op))
    }

    async fn modify_friendship(&self, id: UserId, friend: UserId, op: SetOp) -> Result<()> {
        let mut guard = self.0.lock().await;
        let (user, other) = find_pair_mut(&mut guard, |u| u.id, id, friend)?;

        modify_set(&mut user.friends, friend, op);
        modify_set(&mut other.friends, id, op);

        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository<Post> {
    async fn insert(&self, item: Post) -> Result<bool> {
        let mut guard = self.0.lock().await;

        match find_ref(&guard, |v| v.id == item.id) {
            Ok(_) => return Ok(false),
            Err(RepositoryError::NotFound) => (),
            Err(e) => return Err(e),
        }

        guard.push(item);
        Ok(true)
    }

    async fn find(&self, id: PostId) -> Result<Post> {
        let guard = self.0.lock().await;

        Ok(find_ref(&guard, |v| v.id == id)?.clone())
    }

    async fn finds(&self, query: PostQuery) -> Result<Vec<Post>> {
        let mut posts = self
            .0
            .lock()
            .await
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect::<Vec<_>>();

        sort_recent_first(&mut posts);
        if let Some(limit) = query.limit {
            posts.truncate(limit as usize);
        }

        Ok(posts)
    }

    async fn toggle_like(&self, id: PostId, user_id: UserId) -> Result<Post> {
        let mut guard = self.0.lock().await;
        let item = find_mut(&mut guard, |p| p.id == id)?;

        let op = match item.is_liked_by(user_id) {
            true => SetOp::Remove,
            false => SetOp::Add,
        };
        modify_set(&mut item.likes, user_id, op);

        Ok(item.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::entities::Profile;

    fn user() -> User {
        User {
            id: UserId::generate(),
            profile: Profile::default(),
            friends: HashSet::new(),
        }
    }

    #[tokio::test]
    async fn duplicate_insert_is_refused() {
        let repo = InMemoryRepository::<User>::new();
        let u = user();

        assert!(repo.insert(u.clone()).await.unwrap());
        assert!(!repo.insert(u).await.unwrap());
    }

    #[tokio::test]
    async fn friendship_with_missing_side_writes_nothing() {
        let repo = InMemoryRepository::<User>::new();
        let u = user();
        repo.insert(u.clone()).await.unwrap();

        let ghost = UserId::generate();
        assert!(matches!(
            repo.modify_friendship(u.id, ghost, SetOp::Add).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(repo.find(u.id).await.unwrap().friends.is_empty());
    }

    #[tokio::test]
    async fn finds_filters_by_friend_and_ids() {
        let repo = InMemoryRepository::<User>::new();
        let (a, b, c) = (user(), user(), user());
        for u in [&a, &b, &c] {
            repo.insert(u.clone()).await.unwrap();
        }
        repo.modify_friendship(a.id, b.id, SetOp::Add).await.unwrap();

        let of_a = repo
            .finds(UserQuery {
                friend_of: Some(a.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(of_a.iter().map(|u| u.id).collect::<Vec<_>>(), vec![b.id]);

        let picked = repo.finds(UserQuery::ids(vec![a.id, c.id])).await.unwrap();
        assert_eq!(picked.len(), 2);
    }

    #[tokio::test]
    async fn posts_come_back_newest_first_with_limit() {
        let repo = InMemoryRepository::<Post>::new();
        let author = UserId::generate();
        let now = Utc::now();

        let mut ids = vec![];
        for age in [3, 1, 2] {
            let p = Post {
                id: PostId::generate(),
                author,
                content: format!("{} minutes ago", age),
                image_ref: None,
                likes: HashSet::new(),
                created: now - Duration::minutes(age),
            };
            ids.push((age, p.id));
            repo.insert(p).await.unwrap();
        }
        ids.sort();

        let posts = repo
            .finds(PostQuery {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            posts.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![ids[0].1, ids[1].1]
        );
    }
}
