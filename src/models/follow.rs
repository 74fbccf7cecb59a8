use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Follow {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub user_id: UserId,
    /// Follower's username
    pub user: String,
    #[serde(skip)]
    pub following_id: UserId,
    /// Followed user's username
    pub following: String,
    #[serde(skip)]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowPayload {
    #[serde(default)]
    pub following: Option<String>,
}
