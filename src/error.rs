use std::fmt;

use crate::entities::UserId;

pub type CoreResult<T> = ::std::result::Result<T, CoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Post,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Post => write!(f, "post"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("cannot find {kind}: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("unauthorized.")]
    Unauthorized,

    /// The friend edge between the two users is recorded on one side only.
    #[error("friend edge between {user} and {friend} is one-sided, needs repair")]
    InconsistentState { user: UserId, friend: UserId },

    #[error("storage unavailable: {0}")]
    Unavailable(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl CoreError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool { matches!(self, CoreError::Unavailable(_)) }
}

#[test]
fn only_unavailable_is_retryable() {
    assert!(CoreError::Unavailable(anyhow::anyhow!("timed out")).is_retryable());
    assert!(!CoreError::not_found(EntityKind::Post, "p1").is_retryable());
    assert!(!CoreError::InconsistentState {
        user: UserId::generate(),
        friend: UserId::generate(),
    }
    .is_retryable());

    assert_eq!(
        CoreError::not_found(EntityKind::User, "u1").to_string(),
        "cannot find user: u1"
    );
}
