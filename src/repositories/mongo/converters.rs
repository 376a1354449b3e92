use anyhow::anyhow;
use mongodb::error::{
    Error as MongoError, ErrorKind, Result as MongoResult, RETRYABLE_WRITE_ERROR,
    TRANSIENT_TRANSACTION_ERROR,
};

use super::{RepositoryError, Result as RepoResult};

pub fn convert_repo_err<T>(result: MongoResult<T>) -> RepoResult<T> {
    result.map_err(|e| match is_transient(&e) {
        true => RepositoryError::Unavailable(anyhow!(e)),
        false => RepositoryError::Internal(anyhow!(e)),
    })
}

pub fn is_transient(e: &MongoError) -> bool {
    e.contains_label(TRANSIENT_TRANSACTION_ERROR)
        || e.contains_label(RETRYABLE_WRITE_ERROR)
        || matches!(
            *e.kind,
            ErrorKind::Io(_)
                | ErrorKind::ServerSelection { .. }
                | ErrorKind::ConnectionPoolCleared { .. }
        )
}

pub fn try_unique_check<T>(result: MongoResult<T>) -> RepoResult<bool> {
    let e = match result {
        Ok(_) => return Ok(true),
        Err(e) => e,
    };

    let duplicated = matches!(
        *e.kind,
        ErrorKind::Write(::mongodb::error::WriteFailure::WriteError(ref we)) if we.code == 11000
    );

    match duplicated {
        true => Ok(false),
        false => convert_repo_err(Err(e)),
    }
}

pub fn convert_404_or<T>(option: Option<T>) -> RepoResult<T> {
    match option {
        Some(t) => Ok(t),
        None => Err(RepositoryError::NotFound),
    }
}

pub fn to_bool<N>(number: N) -> bool
where N: ::core::convert::TryInto<i8> + ::core::fmt::Debug + Clone {
    match match ::core::convert::TryInto::<i8>::try_into(number.clone()) {
        Ok(n) => n,
        Err(_) => unreachable!("expected 0 or 1, found: {:?}", number),
    } {
        0 => false,
        1 => true,
        n => unreachable!("expected 0 or 1, found: {}", n),
    }
}
