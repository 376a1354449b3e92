use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};

use super::user::DynUserRepository;
use super::{post_err_fmt, repo_err, user_err_fmt};
use crate::config::StoragePolicy;
use crate::entities::{FeedCursor, FeedScope, Post, PostId};
use crate::error::{CoreError, CoreResult};
use crate::repositories::{PostQuery, PostRepository};
use crate::usecases::post::{get, gets, post, toggle_like};
use crate::utils::{with_deadline, AlsoChain, LetChain};

pub(crate) type DynPostRepository = dyn PostRepository + Sync + Send;

pub struct PostCreateInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub post_repository: Arc<DynPostRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl post::Usecase for PostCreateInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: post::Input) -> CoreResult<post::Output> {
        tracing::trace!("input - {:?}", data);

        let post::Input {
            author,
            content,
            image_ref,
        } = data;

        let image_ref = image_ref.filter(|r| !r.trim().is_empty());
        if content.trim().is_empty() && image_ref.is_none() {
            return Err(CoreError::InvalidOperation(
                "a post needs content or an image".to_string(),
            ));
        }

        with_deadline(self.policy.timeout, self.user_repository.find(author))
            .await
            .map_err(user_err_fmt(author))?;

        // stored with millisecond precision
        let new_post = Post {
            id: PostId::generate(),
            author,
            content,
            image_ref,
            likes: HashSet::new(),
            created: Utc::now().trunc_subsecs(3),
        };

        let can_insert = with_deadline(
            self.policy.timeout,
            self.post_repository.insert(new_post.clone()),
        )
        .await
        .map_err(repo_err)?;

        if !can_insert {
            return Err(CoreError::Internal(anyhow!(
                "post id duplicated: {}",
                new_post.id
            )));
        }

        Ok(post::Output { post: new_post }.also_(|o| tracing::trace!("output - {:?}", o)))
    }
}

pub struct PostGetInteractor {
    pub post_repository: Arc<DynPostRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl get::Usecase for PostGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> CoreResult<get::Output> {
        tracing::trace!("input - {:?}", data);

        let get::Input { post_id } = data;

        with_deadline(self.policy.timeout, self.post_repository.find(post_id))
            .await
            .map_err(post_err_fmt(post_id))?
            .let_(|post| get::Output { post })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct PostGetsInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub post_repository: Arc<DynPostRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl gets::Usecase for PostGetsInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: gets::Input) -> CoreResult<gets::Output> {
        tracing::trace!("input - {:?}", data);

        let gets::Input {
            scope,
            after,
            limit,
        } = data;

        if limit == Some(0) {
            return Err(CoreError::InvalidOperation(
                "page limit must be positive".to_string(),
            ));
        }

        let author = match scope {
            FeedScope::Global => None,
            FeedScope::User(user_id) => {
                with_deadline(self.policy.timeout, self.user_repository.find(user_id))
                    .await
                    .map_err(user_err_fmt(user_id))?;
                Some(user_id)
            },
        };

        let query = PostQuery {
            author,
            after,
            limit,
        };
        let posts = with_deadline(self.policy.timeout, self.post_repository.finds(query))
            .await
            .map_err(repo_err)?;

        let next = match limit {
            Some(l) if posts.len() as u32 >= l => posts.last().map(FeedCursor::of),
            _ => None,
        };

        Ok(gets::Output { posts, next }.also_(|o| tracing::trace!("output - {:?}", o)))
    }
}

pub struct PostLikeToggleInteractor {
    pub post_repository: Arc<DynPostRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl toggle_like::Usecase for PostLikeToggleInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: toggle_like::Input) -> CoreResult<toggle_like::Output> {
        tracing::trace!("input - {:?}", data);

        let toggle_like::Input { post_id, user_id } = data;

        let post = with_deadline(
            self.policy.timeout,
            self.post_repository.toggle_like(post_id, user_id),
        )
        .await
        .map_err(post_err_fmt(post_id))?;
        let liked = post.is_liked_by(user_id);

        tracing::debug!(%post_id, %user_id, liked, "like toggled");

        Ok(toggle_like::Output { post, liked }.also_(|o| tracing::trace!("output - {:?}", o)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Profile, User, UserId};
    use crate::error::EntityKind;
    use crate::repositories::mock::InMemoryRepository;
    use crate::usecases::post::{
        get::Usecase as _, gets::Usecase as _, post::Usecase as _, toggle_like::Usecase as _,
    };

    struct Fixture {
        users: Arc<DynUserRepository>,
        posts: Arc<DynPostRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                users: Arc::new(InMemoryRepository::<User>::new()),
                posts: Arc::new(InMemoryRepository::<Post>::new()),
            }
        }

        async fn user(&self) -> UserId {
            let id = UserId::generate();
            self.users
                .insert(User {
                    id,
                    profile: Profile::default(),
                    friends: HashSet::new(),
                })
                .await
                .unwrap();
            id
        }

        fn creator(&self) -> PostCreateInteractor {
            PostCreateInteractor {
                user_repository: self.users.clone(),
                post_repository: self.posts.clone(),
                policy: StoragePolicy::default(),
            }
        }

        fn lister(&self) -> PostGetsInteractor {
            PostGetsInteractor {
                user_repository: self.users.clone(),
                post_repository: self.posts.clone(),
                policy: StoragePolicy::default(),
            }
        }

        fn liker(&self) -> PostLikeToggleInteractor {
            PostLikeToggleInteractor {
                post_repository: self.posts.clone(),
                policy: StoragePolicy::default(),
            }
        }

        async fn write(&self, author: UserId, content: &str) -> Post {
            self.creator()
                .handle(post::Input {
                    author,
                    content: content.to_string(),
                    image_ref: None,
                })
                .await
                .unwrap()
                .post
        }
    }

    #[tokio::test]
    async fn empty_posts_and_unknown_authors_are_rejected() {
        let f = Fixture::new();
        let author = f.user().await;

        let err = f
            .creator()
            .handle(post::Input {
                author,
                content: "  ".to_string(),
                image_ref: Some("".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation(_)));

        let image_only = f
            .creator()
            .handle(post::Input {
                author,
                content: String::new(),
                image_ref: Some("p1.jpeg".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(image_only.post.image_ref.as_deref(), Some("p1.jpeg"));

        let err = f
            .creator()
            .handle(post::Input {
                author: UserId::generate(),
                content: "hi".to_string(),
                image_ref: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound {
            kind: EntityKind::User,
            ..
        }));
    }

    #[tokio::test]
    async fn like_toggles_back_and_forth() {
        let f = Fixture::new();
        let author = f.user().await;
        let liker = f.user().await;
        let p = f.write(author, "hello").await;
        let input = toggle_like::Input {
            post_id: p.id,
            user_id: liker,
        };

        let out = f.liker().handle(input.clone()).await.unwrap();
        assert!(out.liked);
        assert_eq!(out.post.likes, HashSet::from([liker]));

        let out = f.liker().handle(input).await.unwrap();
        assert!(!out.liked);
        assert!(out.post.likes.is_empty());

        let err = f
            .liker()
            .handle(toggle_like::Input {
                post_id: PostId::generate(),
                user_id: liker,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound {
            kind: EntityKind::Post,
            ..
        }));
    }

    #[tokio::test]
    async fn concurrent_likes_from_different_users_all_land() {
        let f = Fixture::new();
        let author = f.user().await;
        let post_id = f.write(author, "popular").await.id;

        let mut likers = vec![];
        for _ in 0..16 {
            likers.push(f.user().await);
        }

        let handles = likers
            .iter()
            .map(|&user_id| {
                let liker = f.liker();
                tokio::spawn(async move {
                    liker
                        .handle(toggle_like::Input { post_id, user_id })
                        .await
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            assert!(h.await.unwrap().unwrap().liked);
        }

        let stored = PostGetInteractor {
            post_repository: f.posts.clone(),
            policy: StoragePolicy::default(),
        }
        .handle(get::Input { post_id })
        .await
        .unwrap()
        .post;
        assert_eq!(stored.likes, likers.into_iter().collect::<HashSet<_>>());
    }

    async fn toggle_concurrently(f: &Fixture, times: usize) -> bool {
        let author = f.user().await;
        let liker = f.user().await;
        let post_id = f.write(author, "contested").await.id;

        let handles = (0..times)
            .map(|_| {
                let toggler = f.liker();
                tokio::spawn(async move {
                    toggler
                        .handle(toggle_like::Input {
                            post_id,
                            user_id: liker,
                        })
                        .await
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stored = f.posts.find(post_id).await.unwrap();
        assert!(stored.likes.len() <= 1);
        stored.is_liked_by(liker)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_toggles_by_one_user_follow_parity() {
        let f = Fixture::new();

        assert!(toggle_concurrently(&f, 7).await);
        assert!(!toggle_concurrently(&f, 8).await);
    }

    #[tokio::test]
    async fn feed_pages_most_recent_first() {
        let f = Fixture::new();
        let u1 = f.user().await;
        let u2 = f.user().await;

        let mut written = vec![];
        for (i, author) in [u1, u2, u1, u2, u1].into_iter().enumerate() {
            written.push(f.write(author, &format!("post {}", i)).await);
        }
        crate::repositories::sort_recent_first(&mut written);

        let first = f
            .lister()
            .handle(gets::Input {
                scope: FeedScope::Global,
                after: None,
                limit: Some(3),
            })
            .await
            .unwrap();
        assert_eq!(
            first.posts.iter().map(|p| p.id).collect::<Vec<_>>(),
            written[..3].iter().map(|p| p.id).collect::<Vec<_>>()
        );
        assert_eq!(first.next, Some(FeedCursor::of(&written[2])));

        let rest = f
            .lister()
            .handle(gets::Input {
                scope: FeedScope::Global,
                after: first.next,
                limit: Some(3),
            })
            .await
            .unwrap();
        assert_eq!(rest.posts.len(), 2);
        assert_eq!(rest.next, None);

        let own = f
            .lister()
            .handle(gets::Input {
                scope: FeedScope::User(u2),
                after: None,
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(own.posts.len(), 2);
        assert!(own.posts.iter().all(|p| p.author == u2));
    }

    #[tokio::test]
    async fn feed_for_unknown_user_is_not_found() {
        let f = Fixture::new();

        let err = f
            .lister()
            .handle(gets::Input {
                scope: FeedScope::User(UserId::generate()),
                after: None,
                limit: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
