use std::sync::Arc;

use async_trait::async_trait;

use super::{Action, Store};
use crate::entities::{PostId, UserId};
use crate::error::{CoreError, CoreResult};
use crate::presenters::{FriendSummary, PostView, UserView};

/// Server operations the client relies on. `caller` is the identity the
/// server authenticated the request as.
#[async_trait]
pub trait Backend {
    async fn feed(&self, caller: UserId) -> CoreResult<Vec<PostView>>;
    async fn user_feed(&self, caller: UserId, user_id: UserId) -> CoreResult<Vec<PostView>>;

    async fn create_post(
        &self,
        caller: UserId,
        content: String,
        image_ref: Option<String>,
    ) -> CoreResult<PostView>;
    async fn toggle_like(&self, caller: UserId, post_id: PostId) -> CoreResult<PostView>;

    async fn toggle_friend(
        &self,
        caller: UserId,
        friend_id: UserId,
    ) -> CoreResult<Vec<FriendSummary>>;
    async fn get_friends(&self, caller: UserId, user_id: UserId)
        -> CoreResult<Vec<FriendSummary>>;
}

#[async_trait]
impl<T: Backend + Sync + Send + ?Sized> Backend for Arc<T> {
    async fn feed(&self, caller: UserId) -> CoreResult<Vec<PostView>> {
        (**self).feed(caller).await
    }

    async fn user_feed(&self, caller: UserId, user_id: UserId) -> CoreResult<Vec<PostView>> {
        (**self).user_feed(caller, user_id).await
    }

    async fn create_post(
        &self,
        caller: UserId,
        content: String,
        image_ref: Option<String>,
    ) -> CoreResult<PostView> {
        (**self).create_post(caller, content, image_ref).await
    }

    async fn toggle_like(&self, caller: UserId, post_id: PostId) -> CoreResult<PostView> {
        (**self).toggle_like(caller, post_id).await
    }

    async fn toggle_friend(
        &self,
        caller: UserId,
        friend_id: UserId,
    ) -> CoreResult<Vec<FriendSummary>> {
        (**self).toggle_friend(caller, friend_id).await
    }

    async fn get_friends(
        &self,
        caller: UserId,
        user_id: UserId,
    ) -> CoreResult<Vec<FriendSummary>> {
        (**self).get_friends(caller, user_id).await
    }
}

/// Runs each mutation against the server first and only dispatches what the
/// server confirmed. A failed round trip leaves the store untouched.
pub struct Synchronizer<B> {
    backend: B,
    store: Store,
}

impl<B: Backend> Synchronizer<B> {
    pub fn new(backend: B) -> Self { Self::with_store(backend, Store::default()) }

    pub fn with_store(backend: B, store: Store) -> Self { Self { backend, store } }

    pub fn store(&self) -> &Store { &self.store }

    fn caller(&self) -> CoreResult<UserId> {
        let state = self.store.snapshot();

        match (&state.token, &state.user) {
            (Some(_), Some(user)) => Ok(user.id),
            _ => Err(CoreError::Unauthorized),
        }
    }

    pub fn login(&mut self, user: UserView, token: String) -> CoreResult<()> {
        self.store.dispatch(Action::SetAuth { user, token })
    }

    pub fn logout(&mut self) -> CoreResult<()> { self.store.dispatch(Action::ClearAuth) }

    pub fn toggle_mode(&mut self) -> CoreResult<()> { self.store.dispatch(Action::ToggleMode) }

    #[tracing::instrument(skip(self))]
    pub async fn load_feed(&mut self) -> CoreResult<()> {
        let caller = self.caller()?;
        let posts = self.backend.feed(caller).await?;

        self.store.dispatch(Action::SetPosts(posts))
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_user_feed(&mut self, user_id: UserId) -> CoreResult<()> {
        let caller = self.caller()?;
        let posts = self.backend.user_feed(caller, user_id).await?;

        self.store.dispatch(Action::SetPosts(posts))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_post(
        &mut self,
        content: String,
        image_ref: Option<String>,
    ) -> CoreResult<PostView> {
        let caller = self.caller()?;
        let created = self
            .backend
            .create_post(caller, content, image_ref)
            .await?;

        self.store.dispatch(Action::AddPost(created.clone()))?;
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn toggle_like(&mut self, post_id: PostId) -> CoreResult<()> {
        let caller = self.caller()?;
        let updated = self.backend.toggle_like(caller, post_id).await?;

        self.store.dispatch(Action::SetPost(updated))
    }

    #[tracing::instrument(skip(self))]
    pub async fn toggle_friend(&mut self, friend_id: UserId) -> CoreResult<()> {
        let caller = self.caller()?;
        let friends = self.backend.toggle_friend(caller, friend_id).await?;

        self.store.dispatch(Action::SetFriends {
            user_id: caller,
            friends,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn refresh_friends(&mut self) -> CoreResult<()> {
        let caller = self.caller()?;
        let friends = self.backend.get_friends(caller, caller).await?;

        self.store.dispatch(Action::SetFriends {
            user_id: caller,
            friends,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Refuses everything as if the server were down.
    struct DownBackend;

    #[async_trait]
    impl Backend for DownBackend {
        async fn feed(&self, _: UserId) -> CoreResult<Vec<PostView>> { Err(down()) }

        async fn user_feed(&self, _: UserId, _: UserId) -> CoreResult<Vec<PostView>> {
            Err(down())
        }

        async fn create_post(
            &self,
            _: UserId,
            _: String,
            _: Option<String>,
        ) -> CoreResult<PostView> {
            Err(down())
        }

        async fn toggle_like(&self, _: UserId, _: PostId) -> CoreResult<PostView> { Err(down()) }

        async fn toggle_friend(&self, _: UserId, _: UserId) -> CoreResult<Vec<FriendSummary>> {
            Err(down())
        }

        async fn get_friends(&self, _: UserId, _: UserId) -> CoreResult<Vec<FriendSummary>> {
            Err(down())
        }
    }

    fn down() -> CoreError { CoreError::Unavailable(anyhow::anyhow!("connection refused")) }

    fn me() -> UserView {
        UserView {
            id: UserId::generate(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            location: String::new(),
            occupation: String::new(),
            picture_ref: None,
            friends: vec![],
        }
    }

    #[tokio::test]
    async fn anonymous_calls_are_unauthorized() {
        let mut sync = Synchronizer::new(DownBackend);

        assert!(matches!(
            sync.toggle_friend(UserId::generate()).await,
            Err(CoreError::Unauthorized)
        ));
        assert!(matches!(sync.load_feed().await, Err(CoreError::Unauthorized)));
    }

    #[tokio::test]
    async fn failed_round_trip_leaves_cache_untouched() {
        let mut sync = Synchronizer::new(DownBackend);
        sync.login(me(), "token".to_string()).unwrap();
        let before = sync.store().snapshot();

        let err = sync.toggle_friend(UserId::generate()).await.unwrap_err();
        assert!(err.is_retryable());
        let err = sync.toggle_like(PostId::generate()).await.unwrap_err();
        assert!(err.is_retryable());

        assert!(Arc::ptr_eq(&before, &sync.store().snapshot()));
    }
}
