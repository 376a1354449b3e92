use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::Backend;
use crate::entities::{FeedCursor, FeedScope, PostId, Profile, UserId};
use crate::error::CoreResult;
use crate::presenters::user::present_friends;
use crate::presenters::{Feed, FriendSummary, PostView, UserView};
use crate::usecases::user::{OneSidedEdge, RepairPolicy};
use crate::usecases::{post, user};

/// Entry point for authenticated requests. Every operation that acts for a
/// user takes the already verified `caller`.
pub struct Controller {
    pub(crate) register: Arc<dyn user::register::Usecase + Sync + Send>,
    pub(crate) get_user: Arc<dyn user::get::Usecase + Sync + Send>,
    pub(crate) get_friends: Arc<dyn user::get_friends::Usecase + Sync + Send>,
    pub(crate) befriend: Arc<dyn user::befriend::Usecase + Sync + Send>,
    pub(crate) unfriend: Arc<dyn user::unfriend::Usecase + Sync + Send>,
    pub(crate) toggle_friend: Arc<dyn user::toggle_friend::Usecase + Sync + Send>,
    pub(crate) audit: Arc<dyn user::audit::Usecase + Sync + Send>,
    pub(crate) repair: Arc<dyn user::repair::Usecase + Sync + Send>,

    pub(crate) create_post: Arc<dyn post::post::Usecase + Sync + Send>,
    pub(crate) get_post: Arc<dyn post::get::Usecase + Sync + Send>,
    pub(crate) list_posts: Arc<dyn post::gets::Usecase + Sync + Send>,
    pub(crate) toggle_like: Arc<dyn post::toggle_like::Usecase + Sync + Send>,
}

impl Controller {
    pub async fn register(&self, profile: Profile) -> CoreResult<UserView> {
        let user::register::Output { user } = self
            .register
            .handle(user::register::Input { profile })
            .await?;

        Ok(UserView::new(user, vec![]))
    }

    pub async fn get_user(&self, user_id: UserId) -> CoreResult<UserView> {
        let user::get::Output { user, friends } =
            self.get_user.handle(user::get::Input { user_id }).await?;

        Ok(UserView::new(user, friends))
    }

    pub async fn get_friends(&self, user_id: UserId) -> CoreResult<Vec<FriendSummary>> {
        let user::get_friends::Output { friends } = self
            .get_friends
            .handle(user::get_friends::Input { user_id })
            .await?;

        Ok(present_friends(friends))
    }

    pub async fn add_friend(
        &self,
        caller: UserId,
        friend_id: UserId,
    ) -> CoreResult<Vec<FriendSummary>> {
        let user::befriend::Output { friends } = self
            .befriend
            .handle(user::befriend::Input {
                user_id: caller,
                friend_id,
            })
            .await?;

        Ok(present_friends(friends))
    }

    pub async fn remove_friend(
        &self,
        caller: UserId,
        friend_id: UserId,
    ) -> CoreResult<Vec<FriendSummary>> {
        let user::unfriend::Output { friends } = self
            .unfriend
            .handle(user::unfriend::Input {
                user_id: caller,
                friend_id,
            })
            .await?;

        Ok(present_friends(friends))
    }

    pub async fn toggle_friend(
        &self,
        caller: UserId,
        friend_id: UserId,
    ) -> CoreResult<Vec<FriendSummary>> {
        let user::toggle_friend::Output { friends, .. } = self
            .toggle_friend
            .handle(user::toggle_friend::Input {
                user_id: caller,
                friend_id,
            })
            .await?;

        Ok(present_friends(friends))
    }

    pub async fn audit(&self) -> CoreResult<Vec<OneSidedEdge>> {
        Ok(self.audit.handle(user::audit::Input {}).await?.edges)
    }

    pub async fn repair(&self, policy: RepairPolicy) -> CoreResult<Vec<OneSidedEdge>> {
        Ok(self
            .repair
            .handle(user::repair::Input { policy })
            .await?
            .repaired)
    }

    pub async fn create_post(
        &self,
        caller: UserId,
        content: String,
        image_ref: Option<String>,
    ) -> CoreResult<PostView> {
        let post::post::Output { post } = self
            .create_post
            .handle(post::post::Input {
                author: caller,
                content,
                image_ref,
            })
            .await?;

        Ok(post.into())
    }

    pub async fn get_post(&self, post_id: PostId) -> CoreResult<PostView> {
        let post::get::Output { post } = self.get_post.handle(post::get::Input { post_id }).await?;

        Ok(post.into())
    }

    pub async fn toggle_like(&self, caller: UserId, post_id: PostId) -> CoreResult<PostView> {
        let post::toggle_like::Output { post, .. } = self
            .toggle_like
            .handle(post::toggle_like::Input {
                post_id,
                user_id: caller,
            })
            .await?;

        Ok(post.into())
    }

    pub async fn list_posts(
        &self,
        scope: FeedScope,
        after: Option<FeedCursor>,
        limit: Option<u32>,
    ) -> CoreResult<Feed> {
        let post::gets::Output { posts, next } = self
            .list_posts
            .handle(post::gets::Input {
                scope,
                after,
                limit,
            })
            .await?;

        Ok(Feed {
            posts: posts.into_iter().map(PostView::from).collect(),
            next,
        })
    }
}

#[async_trait]
impl Backend for Controller {
    async fn feed(&self, _caller: UserId) -> CoreResult<Vec<PostView>> {
        Ok(self.list_posts(FeedScope::Global, None, None).await?.posts)
    }

    async fn user_feed(&self, _caller: UserId, user_id: UserId) -> CoreResult<Vec<PostView>> {
        Ok(self
            .list_posts(FeedScope::User(user_id), None, None)
            .await?
            .posts)
    }

    async fn create_post(
        &self,
        caller: UserId,
        content: String,
        image_ref: Option<String>,
    ) -> CoreResult<PostView> {
        Controller::create_post(self, caller, content, image_ref).await
    }

    async fn toggle_like(&self, caller: UserId, post_id: PostId) -> CoreResult<PostView> {
        Controller::toggle_like(self, caller, post_id).await
    }

    async fn toggle_friend(
        &self,
        caller: UserId,
        friend_id: UserId,
    ) -> CoreResult<Vec<FriendSummary>> {
        Controller::toggle_friend(self, caller, friend_id).await
    }

    async fn get_friends(&self, _caller: UserId, user_id: UserId) -> CoreResult<Vec<FriendSummary>> {
        Controller::get_friends(self, user_id).await
    }
}
