use std::sync::Arc;
use std::time::Duration;

use mutuals::cache::Synchronizer;
use mutuals::entities::{FeedScope, Profile, UserId};
use mutuals::presenters::UserView;
use mutuals::usecases::user::RepairPolicy;
use mutuals::{in_memory, Controller, CoreError};

async fn register(c: &Controller, first: &str, last: &str) -> UserView {
    c.register(Profile {
        first_name: first.to_string(),
        last_name: last.to_string(),
        location: "Lagos".to_string(),
        occupation: "Engineer".to_string(),
        picture_ref: None,
    })
    .await
    .unwrap()
}

fn ids(view: &UserView) -> Vec<UserId> { view.friends.iter().map(|f| f.id).collect() }

#[tokio::test]
async fn befriending_links_both_users() {
    let c = in_memory();
    let u1 = register(&c, "Ada", "Lovelace").await;
    let u2 = register(&c, "Alan", "Turing").await;

    let friends = c.add_friend(u1.id, u2.id).await.unwrap();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0].name, "Alan Turing");

    assert_eq!(ids(&c.get_user(u1.id).await.unwrap()), vec![u2.id]);
    assert_eq!(ids(&c.get_user(u2.id).await.unwrap()), vec![u1.id]);
    assert!(c.audit().await.unwrap().is_empty());
}

#[tokio::test]
async fn like_toggle_is_an_involution() {
    let c = in_memory();
    let author = register(&c, "Grace", "Hopper").await;
    let u1 = register(&c, "Ada", "Lovelace").await;

    let p1 = c
        .create_post(author.id, "compilers".to_string(), None)
        .await
        .unwrap();
    assert!(p1.likes.is_empty());

    let liked = c.toggle_like(u1.id, p1.id).await.unwrap();
    assert_eq!(liked.like_count(), 1);
    let json = serde_json::to_value(&liked).unwrap();
    assert_eq!(json["likes"][u1.id.to_string()], true);

    let unliked = c.toggle_like(u1.id, p1.id).await.unwrap();
    assert!(unliked.likes.is_empty());
    assert_eq!(c.get_post(p1.id).await.unwrap(), unliked);
}

#[tokio::test]
async fn removing_a_missing_edge_changes_nothing() {
    let c = in_memory();
    let u1 = register(&c, "Ada", "Lovelace").await;
    let u2 = register(&c, "Alan", "Turing").await;
    let u3 = register(&c, "Grace", "Hopper").await;
    c.add_friend(u1.id, u2.id).await.unwrap();

    let before = c.get_user(u1.id).await.unwrap();
    let friends = c.remove_friend(u1.id, u3.id).await.unwrap();

    assert_eq!(friends, before.friends);
    assert_eq!(c.get_user(u1.id).await.unwrap(), before);
    assert!(c.get_user(u3.id).await.unwrap().friends.is_empty());
}

#[tokio::test]
async fn global_feed_is_most_recent_first() {
    let c = in_memory();
    let author = register(&c, "Ada", "Lovelace").await;

    let t1 = c
        .create_post(author.id, "first".to_string(), None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let t2 = c
        .create_post(author.id, "second".to_string(), None)
        .await
        .unwrap();

    let feed = c.list_posts(FeedScope::Global, None, None).await.unwrap();
    assert_eq!(
        feed.posts.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![t2.id, t1.id]
    );
    assert_eq!(feed.next, None);
}

#[tokio::test]
async fn self_friendship_is_invalid() {
    let c = in_memory();
    let u1 = register(&c, "Ada", "Lovelace").await;

    assert!(matches!(
        c.toggle_friend(u1.id, u1.id).await,
        Err(CoreError::InvalidOperation(_))
    ));
    assert!(matches!(
        c.add_friend(u1.id, UserId::generate()).await,
        Err(CoreError::NotFound { .. })
    ));
    assert!(c.repair(RepairPolicy::Drop).await.unwrap().is_empty());
}

#[tokio::test]
async fn synchronizer_follows_confirmed_server_state() {
    let c = Arc::new(in_memory());
    let me = register(&c, "Ada", "Lovelace").await;
    let other = register(&c, "Alan", "Turing").await;

    let mut client = Synchronizer::new(c.clone());
    assert!(matches!(client.load_feed().await, Err(CoreError::Unauthorized)));

    client.login(me.clone(), "opaque".to_string()).unwrap();
    let mut updates = client.store().subscribe();

    let post = client
        .create_post("hello".to_string(), Some("p.png".to_string()))
        .await
        .unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow().posts[0].id, post.id);

    client.toggle_like(post.id).await.unwrap();
    assert!(client.store().snapshot().posts[0].is_liked_by(me.id));

    client.toggle_friend(other.id).await.unwrap();
    let state = client.store().snapshot();
    assert!(state.user.as_ref().unwrap().has_friend(other.id));
    assert!(c.get_user(other.id).await.unwrap().has_friend(me.id));

    // the other client sees the same post after its own round trip
    let mut theirs = Synchronizer::new(c.clone());
    theirs.login(other.clone(), "opaque".to_string()).unwrap();
    theirs.load_user_feed(me.id).await.unwrap();
    assert_eq!(theirs.store().snapshot().posts, client.store().snapshot().posts);

    client.logout().unwrap();
    let state = client.store().snapshot();
    assert!(!state.is_authenticated());
    assert_eq!(state.posts.len(), 1);
    assert!(matches!(
        client.refresh_friends().await,
        Err(CoreError::Unauthorized)
    ));
}
