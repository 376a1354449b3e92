use std::future::Future;
use std::time::Duration;

use anyhow::anyhow;

use crate::repositories::{RepositoryError, Result as RepoResult};

pub(crate) trait LetChain {
    fn let_<F, R>(self, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(Self) -> R;
}
impl<T> LetChain for T {
    #[inline]
    fn let_<F, R>(self, f: F) -> R
    where
        Self: Sized,
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

pub(crate) trait AlsoChain {
    fn also_<F, R>(self, f: F) -> Self
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R;
}
impl<T> AlsoChain for T {
    #[inline]
    fn also_<F, R>(mut self, f: F) -> Self
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R,
    {
        f(&mut self);
        self
    }
}

/// A storage call that outlives `limit` is reported as unavailable, never
/// as a permanent failure.
pub(crate) async fn with_deadline<T, F>(limit: Duration, fut: F) -> RepoResult<T>
where F: Future<Output = RepoResult<T>> {
    match tokio::time::timeout(limit, fut).await {
        Ok(r) => r,
        Err(_) => Err(RepositoryError::Unavailable(anyhow!(
            "storage call timed out after {:?}",
            limit
        ))),
    }
}

#[tokio::test]
async fn deadline_turns_into_unavailable() {
    let slow = async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    };

    assert!(matches!(
        with_deadline(Duration::from_millis(10), slow).await,
        Err(RepositoryError::Unavailable(_))
    ));
    assert_eq!(
        with_deadline(Duration::from_millis(10), async { Ok(7) })
            .await
            .unwrap(),
        7
    );
}
