use serde::{Deserialize, Serialize};

use crate::entities::{User, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendSummary {
    pub id: UserId,
    pub name: String,
    pub occupation: String,
    pub location: String,
    pub picture_ref: Option<String>,
}

impl From<&User> for FriendSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.profile.name(),
            occupation: user.profile.occupation.clone(),
            location: user.profile.location.clone(),
            picture_ref: user.profile.picture_ref.clone(),
        }
    }
}

/// Friend lists are rendered by last name, then first name, then id.
pub fn present_friends(mut friends: Vec<User>) -> Vec<FriendSummary> {
    friends.sort_by(|a, b| {
        (&a.profile.last_name, &a.profile.first_name, a.id).cmp(&(
            &b.profile.last_name,
            &b.profile.first_name,
            b.id,
        ))
    });

    friends.iter().map(FriendSummary::from).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub occupation: String,
    pub picture_ref: Option<String>,
    pub friends: Vec<FriendSummary>,
}

impl UserView {
    pub fn new(user: User, friends: Vec<User>) -> Self {
        let User { id, profile, .. } = user;

        Self {
            id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            location: profile.location,
            occupation: profile.occupation,
            picture_ref: profile.picture_ref,
            friends: present_friends(friends),
        }
    }

    pub fn has_friend(&self, id: UserId) -> bool { self.friends.iter().any(|f| f.id == id) }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::entities::Profile;

    fn named(first: &str, last: &str) -> User {
        User {
            id: UserId::generate(),
            profile: Profile {
                first_name: first.to_string(),
                last_name: last.to_string(),
                ..Default::default()
            },
            friends: HashSet::new(),
        }
    }

    #[test]
    fn friends_are_sorted_by_name() {
        let list = present_friends(vec![
            named("Grace", "Hopper"),
            named("Alan", "Turing"),
            named("Ada", "Hopper"),
        ]);

        assert_eq!(
            list.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["Ada Hopper", "Grace Hopper", "Alan Turing"]
        );
    }

    #[test]
    fn summary_serializes_camel_case() {
        let mut u = named("Ada", "Lovelace");
        u.profile.picture_ref = Some("p.png".to_string());

        let v = serde_json::to_value(FriendSummary::from(&u)).unwrap();
        assert_eq!(v["pictureRef"], "p.png");
        assert_eq!(v["name"], "Ada Lovelace");
        assert_eq!(v["id"], u.id.to_string());
    }
}
