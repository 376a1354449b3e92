pub mod post;
pub mod user;

use anyhow::anyhow;

use crate::error::{CoreError, EntityKind};
use crate::repositories::RepositoryError;

fn repo_err(e: RepositoryError) -> CoreError {
    match e {
        RepositoryError::Unavailable(cause) => CoreError::Unavailable(cause),
        RepositoryError::Internal(cause) => CoreError::Internal(cause),
        e => CoreError::Internal(anyhow!("repository error: {}", e)),
    }
}

fn user_err_fmt(id: impl ToString) -> impl FnOnce(RepositoryError) -> CoreError {
    move |e| match e {
        RepositoryError::NotFound => CoreError::not_found(EntityKind::User, id),
        e => repo_err(e),
    }
}

fn post_err_fmt(id: impl ToString) -> impl FnOnce(RepositoryError) -> CoreError {
    move |e| match e {
        RepositoryError::NotFound => CoreError::not_found(EntityKind::Post, id),
        e => repo_err(e),
    }
}
