use chrono::{DateTime, Utc};
use serde::Serialize;

use super::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created: DateTime<Utc>,
}
