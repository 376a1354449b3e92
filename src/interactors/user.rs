use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;

use super::{repo_err, user_err_fmt};
use crate::config::StoragePolicy;
use crate::entities::{User, UserId};
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::repositories::{RepositoryError, SetOp, UserQuery, UserRepository};
use crate::usecases::user::{
    audit, befriend, get, get_friends, register, repair, toggle_friend, unfriend, OneSidedEdge,
    RepairPolicy,
};
use crate::utils::{with_deadline, AlsoChain, LetChain};

pub(crate) type DynUserRepository = dyn UserRepository + Sync + Send;

async fn find_user(
    repo: &DynUserRepository,
    policy: &StoragePolicy,
    id: UserId,
) -> CoreResult<User> {
    with_deadline(policy.timeout, repo.find(id))
        .await
        .map_err(user_err_fmt(id))
}

async fn friends_of(
    repo: &DynUserRepository,
    policy: &StoragePolicy,
    user: &User,
) -> CoreResult<Vec<User>> {
    if user.friends.is_empty() {
        return Ok(vec![]);
    }

    with_deadline(
        policy.timeout,
        repo.finds(UserQuery::ids(user.friends.iter().copied())),
    )
    .await
    .map_err(repo_err)
}

async fn read_pair(
    repo: &DynUserRepository,
    policy: &StoragePolicy,
    user_id: UserId,
    friend_id: UserId,
) -> CoreResult<(User, User)> {
    let mut found = with_deadline(
        policy.timeout,
        repo.finds(UserQuery::ids(vec![user_id, friend_id])),
    )
    .await
    .map_err(repo_err)?;

    let mut take = |id: UserId| -> CoreResult<User> {
        let i = found
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| CoreError::not_found(EntityKind::User, id))?;
        Ok(found.swap_remove(i))
    };

    let user = take(user_id)?;
    let friend = take(friend_id)?;
    Ok((user, friend))
}

fn inconsistent(user: UserId, friend: UserId) -> CoreError {
    tracing::error!(%user, %friend, "friend edge left one-sided");
    CoreError::InconsistentState { user, friend }
}

/// Writes `op` on both sides of the pair and reads both documents back.
/// A one-sided result is re-applied (the write is idempotent) at most
/// `symmetry_retries` times before giving up with `InconsistentState`.
/// Returns the up-to-date `user_id` document.
async fn apply_friendship(
    repo: &DynUserRepository,
    policy: &StoragePolicy,
    user_id: UserId,
    friend_id: UserId,
    op: SetOp,
) -> CoreResult<User> {
    if user_id == friend_id {
        return Err(CoreError::InvalidOperation(format!(
            "a user cannot be their own friend: {}",
            user_id
        )));
    }

    find_user(repo, policy, user_id).await?;
    find_user(repo, policy, friend_id).await?;

    let mut attempt = 0;
    loop {
        let written =
            with_deadline(policy.timeout, repo.modify_friendship(user_id, friend_id, op)).await;

        match written {
            Ok(()) => (),
            Err(RepositoryError::Unavailable(cause)) if attempt < policy.symmetry_retries => {
                attempt += 1;
                tracing::warn!(
                    "friend write unavailable, retrying ({}/{}): {}",
                    attempt,
                    policy.symmetry_retries,
                    cause
                );
                continue;
            },
            Err(RepositoryError::Unavailable(cause)) => {
                // the store may have kept one side before giving up
                return match read_pair(repo, policy, user_id, friend_id).await {
                    Ok((user, friend))
                        if user.is_friend(friend_id) != friend.is_friend(user_id) =>
                        Err(inconsistent(user_id, friend_id)),
                    _ => Err(CoreError::Unavailable(cause)),
                };
            },
            Err(e) => return Err(user_err_fmt(friend_id)(e)),
        }

        let (user, friend) = read_pair(repo, policy, user_id, friend_id).await?;
        let (forward, backward) = (user.is_friend(friend_id), friend.is_friend(user_id));

        if forward == backward {
            return Ok(user);
        }
        if attempt >= policy.symmetry_retries {
            return Err(inconsistent(user_id, friend_id));
        }

        attempt += 1;
        tracing::warn!(
            %user_id,
            %friend_id,
            forward,
            backward,
            "one-sided friend edge after write, re-applying ({}/{})",
            attempt,
            policy.symmetry_retries
        );
    }
}

async fn scan_edges(
    repo: &DynUserRepository,
    policy: &StoragePolicy,
) -> CoreResult<Vec<OneSidedEdge>> {
    let users = with_deadline(policy.timeout, repo.finds(UserQuery::default()))
        .await
        .map_err(repo_err)?;
    let index = users.iter().map(|u| (u.id, u)).collect::<HashMap<_, _>>();

    let mut edges = vec![];
    for user in &users {
        for friend in &user.friends {
            let edge = match index.get(friend) {
                Some(other) if other.id != user.id && other.is_friend(user.id) => continue,
                Some(other) => OneSidedEdge {
                    holder: user.id,
                    missing: other.id,
                    dangling: other.id == user.id,
                },
                None => OneSidedEdge {
                    holder: user.id,
                    missing: *friend,
                    dangling: true,
                },
            };
            edges.push(edge);
        }
    }

    edges.sort();
    Ok(edges)
}

pub struct UserRegisterInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl register::Usecase for UserRegisterInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: register::Input) -> CoreResult<register::Output> {
        tracing::trace!("input - {:?}", data);

        let register::Input { profile } = data;

        let new_user = User {
            id: UserId::generate(),
            profile,
            friends: HashSet::new(),
        };

        let can_insert = with_deadline(
            self.policy.timeout,
            self.user_repository.insert(new_user.clone()),
        )
        .await
        .map_err(repo_err)?;

        if !can_insert {
            return Err(CoreError::Internal(anyhow!(
                "user id duplicated: {}",
                new_user.id
            )));
        }

        Ok(register::Output { user: new_user }.also_(|o| tracing::trace!("output - {:?}", o)))
    }
}

pub struct UserGetInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl get::Usecase for UserGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get::Input) -> CoreResult<get::Output> {
        tracing::trace!("input - {:?}", data);

        let get::Input { user_id } = data;
        let repo = &*self.user_repository;

        let user = find_user(repo, &self.policy, user_id).await?;
        let friends = friends_of(repo, &self.policy, &user).await?;

        Ok(get::Output { user, friends }.also_(|o| tracing::trace!("output - {:?}", o)))
    }
}

pub struct UserFriendsGetInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl get_friends::Usecase for UserFriendsGetInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: get_friends::Input) -> CoreResult<get_friends::Output> {
        tracing::trace!("input - {:?}", data);

        let get_friends::Input { user_id } = data;
        let repo = &*self.user_repository;

        let user = find_user(repo, &self.policy, user_id).await?;

        friends_of(repo, &self.policy, &user)
            .await?
            .let_(|friends| get_friends::Output { friends })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserBefriendInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl befriend::Usecase for UserBefriendInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: befriend::Input) -> CoreResult<befriend::Output> {
        tracing::trace!("input - {:?}", data);

        let befriend::Input { user_id, friend_id } = data;
        let repo = &*self.user_repository;

        let user = apply_friendship(repo, &self.policy, user_id, friend_id, SetOp::Add).await?;

        friends_of(repo, &self.policy, &user)
            .await?
            .let_(|friends| befriend::Output { friends })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserUnfriendInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl unfriend::Usecase for UserUnfriendInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: unfriend::Input) -> CoreResult<unfriend::Output> {
        tracing::trace!("input - {:?}", data);

        let unfriend::Input { user_id, friend_id } = data;
        let repo = &*self.user_repository;

        let user = apply_friendship(repo, &self.policy, user_id, friend_id, SetOp::Remove).await?;

        friends_of(repo, &self.policy, &user)
            .await?
            .let_(|friends| unfriend::Output { friends })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct UserFriendToggleInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl toggle_friend::Usecase for UserFriendToggleInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: toggle_friend::Input) -> CoreResult<toggle_friend::Output> {
        tracing::trace!("input - {:?}", data);

        let toggle_friend::Input { user_id, friend_id } = data;
        let repo = &*self.user_repository;

        let op = match find_user(repo, &self.policy, user_id)
            .await?
            .is_friend(friend_id)
        {
            true => SetOp::Remove,
            false => SetOp::Add,
        };

        let user = apply_friendship(repo, &self.policy, user_id, friend_id, op).await?;
        let linked = user.is_friend(friend_id);

        friends_of(repo, &self.policy, &user)
            .await?
            .let_(|friends| toggle_friend::Output { friends, linked })
            .also_(|o| tracing::trace!("output - {:?}", o))
            .let_(Ok)
    }
}

pub struct FriendAuditInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl audit::Usecase for FriendAuditInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: audit::Input) -> CoreResult<audit::Output> {
        tracing::trace!("input - {:?}", data);

        let edges = scan_edges(&*self.user_repository, &self.policy).await?;
        if !edges.is_empty() {
            tracing::warn!("found {} one-sided friend edge(s)", edges.len());
        }

        Ok(audit::Output { edges })
    }
}

pub struct FriendRepairInteractor {
    pub user_repository: Arc<DynUserRepository>,
    pub policy: StoragePolicy,
}
#[async_trait]
impl repair::Usecase for FriendRepairInteractor {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, data: repair::Input) -> CoreResult<repair::Output> {
        tracing::trace!("input - {:?}", data);

        let repair::Input { policy } = data;
        let repo = &*self.user_repository;

        let mut repaired = vec![];
        for edge in scan_edges(repo, &self.policy).await? {
            let (holder, target, op) = match (policy, edge.dangling) {
                (RepairPolicy::Restore, false) => (edge.missing, edge.holder, SetOp::Add),
                _ => (edge.holder, edge.missing, SetOp::Remove),
            };

            with_deadline(self.policy.timeout, repo.modify_friend(holder, target, op))
                .await
                .map_err(user_err_fmt(holder))?;

            tracing::info!(holder = %edge.holder, missing = %edge.missing, ?op, "repaired friend edge");
            repaired.push(edge);
        }

        Ok(repair::Output { repaired }.also_(|o| tracing::trace!("output - {:?}", o)))
    }
}
