usecase! {
    post : {
        pub author: entities::UserId,
        pub content: String,
        pub image_ref: Option<String>,
    } => {
        pub post: entities::Post,
    }
}

usecase! {
    get : {
        pub post_id: entities::PostId,
    } => {
        pub post: entities::Post,
    }
}

usecase! {
    gets : {
        pub scope: entities::FeedScope,
        pub after: Option<entities::FeedCursor>,
        pub limit: Option<u32>,
    } => {
        pub posts: Vec<entities::Post>,
        pub next: Option<entities::FeedCursor>,
    }
}

usecase! {
    toggle_like : {
        pub post_id: entities::PostId,
        pub user_id: entities::UserId,
    } => {
        pub post: entities::Post,
        pub liked: bool,
    }
}
