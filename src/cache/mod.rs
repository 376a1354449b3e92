//! Client-side copy of server state. Every change goes through [`reduce`],
//! which never mutates its input.

use serde::{Deserialize, Serialize};

use crate::entities::UserId;
use crate::error::{CoreError, CoreResult};
use crate::presenters::{FriendSummary, PostView, UserView};

pub mod store;
pub mod sync;

pub use store::Store;
pub use sync::{Backend, Synchronizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Light,
    Dark,
}

impl Mode {
    pub fn flipped(self) -> Self {
        match self {
            Mode::Light => Mode::Dark,
            Mode::Dark => Mode::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct State {
    pub mode: Mode,
    pub user: Option<UserView>,
    pub token: Option<String>,
    /// Most recent first, as last received.
    pub posts: Vec<PostView>,
}

impl State {
    pub fn is_authenticated(&self) -> bool { self.token.is_some() }
}

#[derive(Debug, Clone)]
pub enum Action {
    ToggleMode,
    SetAuth { user: UserView, token: String },
    ClearAuth,
    SetFriends {
        user_id: UserId,
        friends: Vec<FriendSummary>,
    },
    SetPosts(Vec<PostView>),
    /// Replaces the cached post with the same id. Unknown posts are ignored.
    SetPost(PostView),
    /// A freshly created post goes to the front.
    AddPost(PostView),
}

pub fn reduce(state: &State, action: Action) -> CoreResult<State> {
    let mut next = state.clone();

    match action {
        Action::ToggleMode => next.mode = next.mode.flipped(),
        Action::SetAuth { user, token } => {
            next.user = Some(user);
            next.token = Some(token);
        },
        Action::ClearAuth => {
            next.user = None;
            next.token = None;
        },
        Action::SetFriends { user_id, friends } => {
            let user = next.user.as_mut().ok_or_else(|| {
                CoreError::InvalidOperation("no user loaded to set friends on".to_string())
            })?;
            if user.id != user_id {
                return Err(CoreError::InvalidOperation(format!(
                    "friend list belongs to {}, loaded user is {}",
                    user_id, user.id
                )));
            }
            user.friends = friends;
        },
        Action::SetPosts(posts) => next.posts = posts,
        Action::SetPost(updated) => {
            if let Some(slot) = next.posts.iter_mut().find(|p| p.id == updated.id) {
                *slot = updated;
            }
        },
        Action::AddPost(created) => match next.posts.iter_mut().find(|p| p.id == created.id) {
            Some(slot) => *slot = created,
            None => next.posts.insert(0, created),
        },
    }

    Ok(next)
}
