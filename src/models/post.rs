use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Authored, GroupId, PostId, UserId};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    #[serde(skip)]
    pub author_id: UserId,
    /// Author's username
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub group: Option<GroupId>,
}

impl Authored for Post {
    fn author_id(&self) -> UserId {
        self.author_id
    }
}

/// Values written when creating or fully replacing a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    pub text: String,
    pub image: Option<String>,
    pub group: Option<GroupId>,
}

/// Request body for post writes. `author` and `pub_date` are read-only and
/// silently ignored if sent.
///
/// The nested options on `image` and `group` separate "absent" from an
/// explicit `null`, which matters for PATCH.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub group: Option<Option<GroupId>>,
}

impl PostPayload {
    /// Full representation for create and PUT; `text` is required.
    pub fn into_fields(self) -> AppResult<PostFields> {
        Ok(PostFields {
            text: require_text(self.text)?,
            image: self.image.flatten(),
            group: self.group.flatten(),
        })
    }

    /// PATCH: only the fields that were sent overwrite `current`.
    pub fn merge_into(self, current: &Post) -> AppResult<PostFields> {
        let text = match self.text {
            Some(text) => require_text(Some(text))?,
            None => current.text.clone(),
        };
        Ok(PostFields {
            text,
            image: self.image.unwrap_or_else(|| current.image.clone()),
            group: self.group.unwrap_or(current.group),
        })
    }
}

pub(crate) fn require_text(text: Option<String>) -> AppResult<String> {
    match text {
        None => Err(AppError::Validation("text: This field is required.".to_string())),
        Some(text) if text.trim().is_empty() => {
            Err(AppError::Validation("text: This field may not be blank.".to_string()))
        }
        Some(text) => Ok(text),
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            id: 1,
            author_id: 7,
            author: "leo".to_string(),
            text: "original".to_string(),
            pub_date: Utc::now(),
            image: Some("posts/cat.png".to_string()),
            group: Some(3),
        }
    }

    #[test]
    fn test_payload_requires_text() {
        let payload: PostPayload = serde_json::from_str(r#"{"group": 1}"#).unwrap();
        assert!(matches!(payload.into_fields(), Err(AppError::Validation(_))));

        let blank: PostPayload = serde_json::from_str(r#"{"text": "   "}"#).unwrap();
        assert!(matches!(blank.into_fields(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let post = sample_post();

        let untouched: PostPayload = serde_json::from_str(r#"{"text": "edited"}"#).unwrap();
        let fields = untouched.merge_into(&post).unwrap();
        assert_eq!(fields.text, "edited");
        assert_eq!(fields.group, Some(3));
        assert_eq!(fields.image.as_deref(), Some("posts/cat.png"));

        let cleared: PostPayload = serde_json::from_str(r#"{"group": null}"#).unwrap();
        let fields = cleared.merge_into(&post).unwrap();
        assert_eq!(fields.text, "original");
        assert_eq!(fields.group, None);
    }

    #[test]
    fn test_serialized_post_hides_author_id() {
        let value = serde_json::to_value(sample_post()).unwrap();
        assert_eq!(value["author"], "leo");
        assert!(value.get("author_id").is_none());
        assert!(value.get("pub_date").is_some());
    }
}
