use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! entity_id {
    ($n:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $n(Uuid);

        impl $n {
            pub fn generate() -> Self { Self(Uuid::new_v4()) }

            /// Malformed input is rejected as an invalid operation, not a lookup miss.
            pub fn parse(s: impl AsRef<str>) -> Result<Self, CoreError> {
                let s = s.as_ref();
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    CoreError::InvalidOperation(format!(
                        "malformed {} `{}`: {}",
                        stringify!($n),
                        s,
                        e
                    ))
                })
            }
        }

        impl From<Uuid> for $n {
            fn from(u: Uuid) -> Self { Self(u) }
        }

        impl FromStr for $n {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
        }

        impl fmt::Display for $n {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
        }
    };
}

entity_id!(UserId);
entity_id!(PostId);

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub occupation: String,
    pub picture_ref: Option<String>,
}

impl Profile {
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub profile: Profile,
    /// Never contains `id` itself. Mirrored by every listed user.
    pub friends: HashSet<UserId>,
}

impl User {
    pub fn is_friend(&self, other: UserId) -> bool { self.friends.contains(&other) }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub content: String,
    pub image_ref: Option<String>,
    pub likes: HashSet<UserId>,
    pub created: DateTime<Utc>,
}

impl Post {
    pub fn is_liked_by(&self, user: UserId) -> bool { self.likes.contains(&user) }
}

/// Position in a most-recent-first listing. Posts strictly after the cursor
/// are older, or equally old with a smaller id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub created: DateTime<Utc>,
    pub id: PostId,
}

impl FeedCursor {
    pub fn of(post: &Post) -> Self {
        Self {
            created: post.created,
            id: post.id,
        }
    }

    pub fn is_before(&self, post: &Post) -> bool {
        (post.created, post.id) < (self.created, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    User(UserId),
}

#[test]
fn id_parse_rejects_garbage() {
    let id = UserId::generate();
    assert_eq!(UserId::parse(id.to_string()).unwrap(), id);
    assert_eq!(format!(" {} ", id).parse::<UserId>().unwrap(), id);

    match PostId::parse("not-an-id") {
        Err(CoreError::InvalidOperation(m)) => assert!(m.contains("PostId")),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn cursor_orders_by_time_then_id() {
    let created = Utc::now();
    let a = Post {
        id: PostId::generate(),
        author: UserId::generate(),
        content: "a".to_string(),
        image_ref: None,
        likes: HashSet::new(),
        created,
    };
    let b = Post {
        id: PostId::generate(),
        ..a.clone()
    };
    let (hi, lo) = if a.id > b.id { (a, b) } else { (b, a) };

    let cursor = FeedCursor::of(&hi);
    assert!(cursor.is_before(&lo));
    assert!(!cursor.is_before(&hi));
    assert!(!FeedCursor::of(&lo).is_before(&hi));
}
