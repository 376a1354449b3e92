use std::sync::Arc;

use crate::config::{StoragePolicy, StoreConfig};
use crate::controllers::Controller;
use crate::entities::{Post, User};
use crate::interactors::post::{
    DynPostRepository, PostCreateInteractor, PostGetInteractor, PostGetsInteractor,
    PostLikeToggleInteractor,
};
use crate::interactors::user::{
    DynUserRepository, FriendAuditInteractor, FriendRepairInteractor, UserBefriendInteractor,
    UserFriendToggleInteractor, UserFriendsGetInteractor, UserGetInteractor,
    UserRegisterInteractor, UserUnfriendInteractor,
};
use crate::repositories::mock::InMemoryRepository;
use crate::repositories::mongo::{MongoPostRepository, MongoUserRepository};

pub fn in_memory() -> Controller { in_memory_with(StoragePolicy::default()) }

pub fn in_memory_with(policy: StoragePolicy) -> Controller {
    assemble(
        Arc::new(InMemoryRepository::<User>::new()),
        Arc::new(InMemoryRepository::<Post>::new()),
        policy,
    )
}

pub async fn mongo(config: &StoreConfig) -> ::anyhow::Result<Controller> {
    let c = ::mongodb::Client::with_uri_str(&config.mongo_uri).await?;
    let db = c.database(&config.db_name);

    let users = MongoUserRepository::new_with(c, db.clone(), config.transaction_retries).await?;
    let posts = MongoPostRepository::new_with(db).await?;

    Ok(assemble(Arc::new(users), Arc::new(posts), config.policy()))
}

fn assemble(
    users: Arc<DynUserRepository>,
    posts: Arc<DynPostRepository>,
    policy: StoragePolicy,
) -> Controller {
    Controller {
        register: Arc::new(UserRegisterInteractor {
            user_repository: users.clone(),
            policy,
        }),
        get_user: Arc::new(UserGetInteractor {
            user_repository: users.clone(),
            policy,
        }),
        get_friends: Arc::new(UserFriendsGetInteractor {
            user_repository: users.clone(),
            policy,
        }),
        befriend: Arc::new(UserBefriendInteractor {
            user_repository: users.clone(),
            policy,
        }),
        unfriend: Arc::new(UserUnfriendInteractor {
            user_repository: users.clone(),
            policy,
        }),
        toggle_friend: Arc::new(UserFriendToggleInteractor {
            user_repository: users.clone(),
            policy,
        }),
        audit: Arc::new(FriendAuditInteractor {
            user_repository: users.clone(),
            policy,
        }),
        repair: Arc::new(FriendRepairInteractor {
            user_repository: users.clone(),
            policy,
        }),

        create_post: Arc::new(PostCreateInteractor {
            user_repository: users.clone(),
            post_repository: posts.clone(),
            policy,
        }),
        get_post: Arc::new(PostGetInteractor {
            post_repository: posts.clone(),
            policy,
        }),
        list_posts: Arc::new(PostGetsInteractor {
            user_repository: users,
            post_repository: posts.clone(),
            policy,
        }),
        toggle_like: Arc::new(PostLikeToggleInteractor {
            post_repository: posts,
            policy,
        }),
    }
}
