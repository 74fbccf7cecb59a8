use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{post::require_text, Authored, CommentId, PostId, UserId};
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(skip)]
    pub author_id: UserId,
    pub author: String,
    pub post: PostId,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Authored for Comment {
    fn author_id(&self) -> UserId {
        self.author_id
    }
}

/// Request body for comment writes; `post` comes from the URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPayload {
    #[serde(default)]
    pub text: Option<String>,
}

impl CommentPayload {
    pub fn into_text(self) -> AppResult<String> {
        require_text(self.text)
    }

    pub fn merge_into(self, current: &Comment) -> AppResult<String> {
        match self.text {
            Some(text) => require_text(Some(text)),
            None => Ok(current.text.clone()),
        }
    }
}
