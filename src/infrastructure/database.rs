// Database Interface - persistence seam for blog records
// Handlers and services only see this trait; SQL lives in the implementations

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    group::NewGroup, post::PostFields, Comment, CommentId, Follow, Group, GroupId, Post, PostId,
    User, UserId,
};

/// A limit/offset window over an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

/// Storage operations for the blog entities.
///
/// Lookups return `Ok(None)` for missing rows; the caller decides whether
/// that is a 404 or a validation error.
#[async_trait]
pub trait BlogStore: Send + Sync {
    // Users
    async fn create_user(&self, username: &str) -> AppResult<User>;
    async fn get_user(&self, id: UserId) -> AppResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    // Groups
    async fn create_group(&self, group: NewGroup) -> AppResult<Group>;
    async fn get_group(&self, id: GroupId) -> AppResult<Option<Group>>;
    async fn list_groups(&self) -> AppResult<Vec<Group>>;
    /// Deleting a group detaches its posts instead of removing them.
    async fn delete_group(&self, id: GroupId) -> AppResult<bool>;

    // Posts
    async fn create_post(&self, author: UserId, fields: PostFields) -> AppResult<Post>;
    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>>;
    async fn list_posts(&self, window: Option<PageWindow>) -> AppResult<Vec<Post>>;
    async fn count_posts(&self) -> AppResult<u64>;
    async fn update_post(&self, id: PostId, fields: PostFields) -> AppResult<Option<Post>>;
    /// Deleting a post removes its comments.
    async fn delete_post(&self, id: PostId) -> AppResult<bool>;

    // Comments
    async fn create_comment(&self, author: UserId, post: PostId, text: &str) -> AppResult<Comment>;
    async fn get_comment(&self, post: PostId, id: CommentId) -> AppResult<Option<Comment>>;
    async fn list_comments(&self, post: PostId) -> AppResult<Vec<Comment>>;
    async fn update_comment(&self, id: CommentId, text: &str) -> AppResult<Option<Comment>>;
    async fn delete_comment(&self, id: CommentId) -> AppResult<bool>;

    // Follows
    /// Returns `Ok(None)` when the pair already exists.
    async fn create_follow(&self, user: UserId, following: UserId) -> AppResult<Option<Follow>>;
    async fn follow_exists(&self, user: UserId, following: UserId) -> AppResult<bool>;
    /// Follows made by `user`, newest first, optionally filtered by a
    /// case-insensitive substring of the followed username.
    async fn list_follows(&self, user: UserId, search: Option<&str>) -> AppResult<Vec<Follow>>;
}
