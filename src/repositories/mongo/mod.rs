use std::convert::TryFrom;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::Result as MongoResult;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use tracing::Instrument;

use super::{
    PostQuery, PostRepository, RepositoryError, Result, SetOp, UserQuery, UserRepository,
};
use crate::entities::{Post, PostId, User, UserId};
use crate::utils::LetChain;

mod converters;
mod helpers;
mod models;
mod type_convert;

use converters::{convert_404_or, convert_repo_err, to_bool, try_unique_check};
use helpers::{exec_transaction, get_one, initialize_coll, make_session, process_transaction};
use models::{MongoPostModel, MongoUserModel};

fn set_operator(op: SetOp) -> &'static str {
    match op {
        SetOp::Add => "$addToSet",
        SetOp::Remove => "$pull",
    }
}

pub struct MongoUserRepository {
    client: Client,
    coll: Collection<MongoUserModel>,
    transaction_retries: u32,
}

impl MongoUserRepository {
    pub async fn new_with(
        client: Client,
        db: Database,
        transaction_retries: u32,
    ) -> ::anyhow::Result<Self> {
        initialize_coll("users", vec![], &db).await?;

        let coll = db.collection("users");

        Ok(Self {
            client,
            coll,
            transaction_retries,
        })
    }
}

pub struct MongoPostRepository {
    coll: Collection<MongoPostModel>,
}

impl MongoPostRepository {
    pub async fn new_with(db: Database) -> ::anyhow::Result<Self> {
        let feed_index = doc! {
            "name": "feed_order",
            "key": {
                "author": 1,
                "created_ms": -1,
                "id": -1
            }
        };
        initialize_coll("posts", vec![feed_index], &db).await?;

        let coll = db.collection("posts");

        Ok(Self { coll })
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: User) -> Result<bool> {
        let model: MongoUserModel = user.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: UserId) -> Result<User> {
        let user = get_one(&self.coll, id.to_string())
            .await?
            .let_(User::try_from)?;

        if user.id != id {
            return Err(RepositoryError::Internal(anyhow!(
                "asked for {}, store returned {}",
                id,
                user.id
            )));
        }
        Ok(user)
    }

    async fn finds(&self, query: UserQuery) -> Result<Vec<User>> {
        let query_doc: Document = query.into();

        self.coll
            .find(query_doc, None)
            .instrument(tracing::trace_span!("find"))
            .await
            .let_(convert_repo_err)?
            .try_collect::<Vec<_>>()
            .await
            .let_(convert_repo_err)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn modify_friend(&self, id: UserId, friend: UserId, op: SetOp) -> Result<bool> {
        let operation = set_operator(op);
        let res = self
            .coll
            .update_one(
                doc! { "id": id.to_string() },
                doc! { operation: { "friends": friend.to_string() } },
                None,
            )
            .instrument(tracing::trace_span!("update_one"))
            .await
            .let_(convert_repo_err)?;

        if !res.matched_count.let_(to_bool) {
            return Err(RepositoryError::NotFound);
        }
        Ok(res.modified_count.let_(to_bool))
    }

    async fn modify_friendship(&self, id: UserId, friend: UserId, op: SetOp) -> Result<()> {
        async fn transaction(
            this: &MongoUserRepository,
            id: &str,
            friend: &str,
            op: SetOp,
        ) -> MongoResult<Option<()>> {
            let mut session = make_session(&this.client).await?;
            let operation = set_operator(op);

            for (holder, target) in [(id, friend), (friend, id)] {
                let res = this
                    .coll
                    .update_one_with_session(
                        doc! { "id": holder },
                        doc! { operation: { "friends": target } },
                        None,
                        &mut session,
                    )
                    .instrument(tracing::trace_span!("update_one_with_session"))
                    .await?;

                if !res.matched_count.let_(to_bool) {
                    session.abort_transaction().await?;
                    return Ok(None);
                }
            }

            process_transaction(&mut session, this.transaction_retries)
                .await
                .map(|_| Some(()))
        }

        let (id, friend) = (id.to_string(), friend.to_string());
        let (id, friend) = (id.as_str(), friend.as_str());

        exec_transaction(self.transaction_retries, move || {
            transaction(self, id, friend, op)
        })
        .await
        .let_(convert_repo_err)?
        .let_(convert_404_or)
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn insert(&self, item: Post) -> Result<bool> {
        let model: MongoPostModel = item.into();

        self.coll
            .insert_one(model, None)
            .instrument(tracing::trace_span!("insert_one"))
            .await
            .let_(try_unique_check)
    }

    async fn find(&self, id: PostId) -> Result<Post> {
        get_one(&self.coll, id.to_string())
            .await?
            .let_(Post::try_from)
    }

    async fn finds(&self, query: PostQuery) -> Result<Vec<Post>> {
        let query_doc = Document::from(&query);
        let options = FindOptions::builder()
            .sort(doc! { "created_ms": -1, "id": -1 })
            .limit(query.limit.map(i64::from))
            .build();

        self.coll
            .find(query_doc, options)
            .instrument(tracing::trace_span!("find"))
            .await
            .let_(convert_repo_err)?
            .try_collect::<Vec<_>>()
            .await
            .let_(convert_repo_err)?
            .into_iter()
            .map(Post::try_from)
            .collect()
    }

    async fn toggle_like(&self, id: PostId, user_id: UserId) -> Result<Post> {
        let user = user_id.to_string();
        let user = user.as_str();

        // one pipeline update: membership test and write happen server-side
        let pipeline = vec![doc! {
            "$set": {
                "likes": {
                    "$cond": [
                        { "$in": [user, "$likes"] },
                        { "$setDifference": ["$likes", [user]] },
                        { "$setUnion": ["$likes", [user]] }
                    ]
                }
            }
        }];
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.coll
            .find_one_and_update(doc! { "id": id.to_string() }, pipeline, options)
            .instrument(tracing::trace_span!("find_one_and_update"))
            .await
            .let_(convert_repo_err)?
            .let_(convert_404_or)?
            .let_(Post::try_from)
    }
}
