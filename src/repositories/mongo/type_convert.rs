use std::collections::HashSet;
use std::convert::TryFrom;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{TimeZone, Utc};
use mongodb::bson::{doc, Document};

use super::models::{MongoPostModel, MongoUserModel};
use super::{PostQuery, RepositoryError, Result, UserQuery};
use crate::entities::{Post, Profile, User};
use crate::error::CoreError;

fn parse_id<T>(raw: &str) -> Result<T>
where T: FromStr<Err = CoreError> {
    raw.parse()
        .map_err(|e: CoreError| RepositoryError::Internal(anyhow!("corrupt document: {}", e)))
}

fn parse_ids<T>(raw: &HashSet<String>) -> Result<HashSet<T>>
where T: FromStr<Err = CoreError> + Eq + ::core::hash::Hash {
    raw.iter().map(|s| parse_id(s)).collect()
}

impl From<User> for MongoUserModel {
    fn from(
        User {
            id,
            profile:
                Profile {
                    first_name,
                    last_name,
                    location,
                    occupation,
                    picture_ref,
                },
            friends,
        }: User,
    ) -> Self {
        Self {
            id: id.to_string(),
            first_name,
            last_name,
            location,
            occupation,
            picture_ref,
            friends: friends.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl TryFrom<MongoUserModel> for User {
    type Error = RepositoryError;

    fn try_from(model: MongoUserModel) -> Result<Self> {
        Ok(User {
            id: parse_id(&model.id)?,
            friends: parse_ids(&model.friends)?,
            profile: Profile {
                first_name: model.first_name,
                last_name: model.last_name,
                location: model.location,
                occupation: model.occupation,
                picture_ref: model.picture_ref,
            },
        })
    }
}

impl From<Post> for MongoPostModel {
    fn from(
        Post {
            id,
            author,
            content,
            image_ref,
            likes,
            created,
        }: Post,
    ) -> Self {
        Self {
            id: id.to_string(),
            author: author.to_string(),
            content,
            image_ref,
            likes: likes.iter().map(|u| u.to_string()).collect(),
            created_ms: created.timestamp_millis(),
        }
    }
}

impl TryFrom<MongoPostModel> for Post {
    type Error = RepositoryError;

    fn try_from(model: MongoPostModel) -> Result<Self> {
        let created = Utc
            .timestamp_millis_opt(model.created_ms)
            .single()
            .ok_or_else(|| {
                RepositoryError::Internal(anyhow!(
                    "corrupt document: timestamp out of range: {}",
                    model.created_ms
                ))
            })?;

        Ok(Post {
            id: parse_id(&model.id)?,
            author: parse_id(&model.author)?,
            likes: parse_ids(&model.likes)?,
            content: model.content,
            image_ref: model.image_ref,
            created,
        })
    }
}

impl From<UserQuery> for Document {
    fn from(UserQuery { ids, friend_of }: UserQuery) -> Self {
        let mut query = doc! {};

        if let Some(set) = ids {
            let set = set.iter().map(|i| i.to_string()).collect::<Vec<_>>();
            query.insert("id", doc! { "$in": set });
        }

        if let Some(friend) = friend_of {
            query.insert("friends", friend.to_string());
        }

        query
    }
}

impl From<&PostQuery> for Document {
    fn from(PostQuery { author, after, .. }: &PostQuery) -> Self {
        let mut query = doc! {};

        if let Some(author) = author {
            query.insert("author", author.to_string());
        }

        if let Some(cursor) = after {
            let ms = cursor.created.timestamp_millis();
            query.insert("$or", vec![
                doc! { "created_ms": { "$lt": ms } },
                doc! { "created_ms": ms, "id": { "$lt": cursor.id.to_string() } },
            ]);
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FeedCursor, PostId, UserId};

    #[test]
    fn user_survives_model_conversion() {
        let friend = UserId::generate();
        let user = User {
            id: UserId::generate(),
            profile: Profile {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                location: "London".to_string(),
                occupation: "Analyst".to_string(),
                picture_ref: Some("ada.png".to_string()),
            },
            friends: vec![friend].into_iter().collect(),
        };

        let back = User::try_from(MongoUserModel::from(user.clone())).unwrap();
        assert_eq!(back.id, user.id);
        assert_eq!(back.profile, user.profile);
        assert_eq!(back.friends, user.friends);
    }

    #[test]
    fn corrupt_ids_are_internal_errors() {
        let model = MongoUserModel {
            id: "nope".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            location: String::new(),
            occupation: String::new(),
            picture_ref: None,
            friends: HashSet::new(),
        };

        assert!(matches!(
            User::try_from(model),
            Err(RepositoryError::Internal(_))
        ));
    }

    #[test]
    fn post_query_builds_cursor_filter() {
        let author = UserId::generate();
        let query = PostQuery {
            author: Some(author),
            after: Some(FeedCursor {
                created: Utc.timestamp_millis_opt(1_000).unwrap(),
                id: PostId::generate(),
            }),
            limit: Some(10),
        };

        let d = Document::from(&query);
        assert_eq!(d.get_str("author").unwrap(), author.to_string());
        assert_eq!(d.get_array("$or").unwrap().len(), 2);
    }
}
