use crate::error::{AppError, AppResult};
use crate::models::{User, UserId};

/// Who is making the current request.
///
/// Built once per request by the viewer context middleware and read by
/// handlers and privacy rules.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub user: Option<User>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        ViewerContext {
            request_id,
            user: None,
        }
    }

    pub fn authenticated_user(user: User, request_id: String) -> Self {
        ViewerContext {
            request_id,
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|user| user.id)
    }

    /// The authenticated user, or 401 for anonymous viewers
    pub fn require_user(&self) -> AppResult<&User> {
        self.user.as_ref().ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_anonymous_viewer() {
        let vc = ViewerContext::anonymous("req-1".to_string());
        assert!(!vc.is_authenticated());
        assert_eq!(vc.user_id(), None);
        assert!(matches!(vc.require_user(), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_authenticated_viewer() {
        let user = User {
            id: 5,
            username: "leo".to_string(),
            created: Utc::now(),
        };
        let vc = ViewerContext::authenticated_user(user, "req-2".to_string());
        assert!(vc.is_authenticated());
        assert_eq!(vc.user_id(), Some(5));
        assert_eq!(vc.require_user().unwrap().username, "leo");
    }
}
