//! Outward shapes of the core's results, as the client receives them.

pub mod post;
pub mod user;

pub use post::{Feed, PostView};
pub use user::{FriendSummary, UserView};
