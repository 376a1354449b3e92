use std::collections::HashSet;

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoUserModel {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub occupation: String,
    pub picture_ref: Option<String>,
    pub friends: HashSet<String>,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
pub struct MongoPostModel {
    pub id: String,
    pub author: String,
    pub content: String,
    pub image_ref: Option<String>,
    pub likes: HashSet<String>,
    /// Unix millis, sortable.
    pub created_ms: i64,
}
