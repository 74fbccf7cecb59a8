use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::GroupId;
use crate::error::{AppError, AppResult};

pub const MAX_TITLE_LEN: usize = 100;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Input for creating a group. Groups are managed out of band, so this is
/// only reachable through the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewGroup {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title: This field may not be blank.".to_string()));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title: Ensure this field has no more than {} characters.",
                MAX_TITLE_LEN
            )));
        }
        if !is_valid_slug(&self.slug) {
            return Err(AppError::Validation(
                "slug: Enter a valid slug consisting of letters, numbers, underscores or hyphens."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("cats"));
        assert!(is_valid_slug("rust-lang_2024"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("slash/y"));
    }

    #[test]
    fn test_new_group_validation() {
        assert!(NewGroup::new("Cats", "cats").validate().is_ok());
        assert!(NewGroup::new("  ", "cats").validate().is_err());
        assert!(NewGroup::new("x".repeat(101), "cats").validate().is_err());
        assert!(NewGroup::new("Cats", "c a t s").validate().is_err());
    }
}
