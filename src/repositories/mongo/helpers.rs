use mongodb::bson::{doc, Document};
use mongodb::error::{
    Result as MongoResult, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT,
};
use mongodb::options::{Acknowledgment, ReadConcern, TransactionOptions, WriteConcern};
use mongodb::{Client, ClientSession, Collection, Database};
use tracing::Instrument;

use super::converters::{convert_404_or, convert_repo_err};
use super::Result as RepoResult;
use crate::utils::LetChain;

pub async fn initialize_coll(
    coll_name: &str,
    extra_indexes: Vec<Document>,
    db: &Database,
) -> MongoResult<()> {
    let mut indexes = vec![doc! {
        "name": "unique_id",
        "key": {
            "id": 1
        },
        "unique": true
    }];
    indexes.extend(extra_indexes);

    db.run_command(
        doc! {
            "createIndexes": coll_name,
            "indexes": indexes,
        },
        None,
    )
    .instrument(tracing::trace_span!("run_command"))
    .await?;

    Ok(())
}

pub async fn make_session(c: &Client) -> MongoResult<ClientSession> {
    let mut s = c
        .start_session(None)
        .instrument(tracing::trace_span!("start_session"))
        .await?;

    let ta_opt = TransactionOptions::builder()
        .read_concern(ReadConcern::snapshot())
        .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
        .build();
    s.start_transaction(ta_opt)
        .instrument(tracing::trace_span!("start_transaction"))
        .await?;

    Ok(s)
}

/// Commits, retrying only while the server cannot tell whether the commit
/// happened. Committing twice is safe.
pub async fn process_transaction(s: &mut ClientSession, retries: u32) -> MongoResult<()> {
    let mut attempt = 0;

    loop {
        let r = s
            .commit_transaction()
            .instrument(tracing::trace_span!("commit_transaction"))
            .await;
        if let Err(ref e) = r {
            if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT) && attempt < retries {
                attempt += 1;
                continue;
            }
        }

        break r;
    }
}

/// Reruns the whole transaction on `TransientTransactionError`, at most
/// `retries` extra times.
pub async fn exec_transaction<F, FO, RO>(retries: u32, mut f: F) -> MongoResult<RO>
where
    F: FnMut() -> FO,
    FO: ::core::future::Future<Output = MongoResult<RO>>,
{
    let mut attempt = 0;

    loop {
        let r = f().await;
        if let Err(ref e) = r {
            if e.contains_label(TRANSIENT_TRANSACTION_ERROR) && attempt < retries {
                attempt += 1;
                tracing::debug!("transient transaction error, retrying ({}/{})", attempt, retries);
                continue;
            }
        }

        break r;
    }
}

pub async fn get_one<T>(coll: &Collection<T>, id: impl Into<::mongodb::bson::Bson>) -> RepoResult<T>
where T: Sync + Send + Unpin + ::serde::de::DeserializeOwned {
    let res = coll
        .find_one(doc! { "id": id.into() }, None)
        .instrument(tracing::trace_span!("find_one"))
        .await
        .let_(convert_repo_err)?
        .let_(convert_404_or)?;

    Ok(res)
}
