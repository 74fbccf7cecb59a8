// Blog domain records, as returned by the store and rendered by the API

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use follow::Follow;
pub use group::Group;
pub use post::Post;
pub use user::User;

pub type UserId = i64;
pub type GroupId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// Entity kinds known to the privacy layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EntityType {
    Group,
    Post,
    Comment,
    Follow,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Group => "group",
            EntityType::Post => "post",
            EntityType::Comment => "comment",
            EntityType::Follow => "follow",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records that carry an author, so ownership checks can be made generically.
pub trait Authored {
    fn author_id(&self) -> UserId;
}
