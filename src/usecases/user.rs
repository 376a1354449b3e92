usecase! {
    register : {
        pub profile: entities::Profile,
    } => {
        pub user: entities::User,
    }
}

usecase! {
    get : {
        pub user_id: entities::UserId,
    } => {
        pub user: entities::User,
        pub friends: Vec<entities::User>,
    }
}

usecase! {
    get_friends : {
        pub user_id: entities::UserId,
    } => {
        pub friends: Vec<entities::User>,
    }
}

usecase! {
    befriend : {
        pub user_id: entities::UserId,
        pub friend_id: entities::UserId,
    } => {
        pub friends: Vec<entities::User>,
    }
}

usecase! {
    unfriend : {
        pub user_id: entities::UserId,
        pub friend_id: entities::UserId,
    } => {
        pub friends: Vec<entities::User>,
    }
}

usecase! {
    toggle_friend : {
        pub user_id: entities::UserId,
        pub friend_id: entities::UserId,
    } => {
        pub friends: Vec<entities::User>,
        pub linked: bool,
    }
}

usecase! {
    audit : {} => {
        pub edges: Vec<super::OneSidedEdge>,
    }
}

usecase! {
    repair : {
        pub policy: super::RepairPolicy,
    } => {
        pub repaired: Vec<super::OneSidedEdge>,
    }
}

use serde::Serialize;

use crate::entities::UserId;

/// `holder` lists `missing` as a friend, but `missing` does not list
/// `holder` back. `dangling` edges point at a user that does not exist, or at
/// `holder` itself; repair always removes those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct OneSidedEdge {
    pub holder: UserId,
    pub missing: UserId,
    pub dangling: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairPolicy {
    /// Add the missing back-edge.
    Restore,
    /// Remove the edge from the holder.
    Drop,
}
