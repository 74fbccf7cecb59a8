// FollowService - guards the follow graph against self-follows and duplicates

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    infrastructure::database::BlogStore,
    models::{Follow, User, UserId},
};

pub const SELF_FOLLOW_MESSAGE: &str = "You cannot follow yourself.";
pub const DUPLICATE_FOLLOW_MESSAGE: &str = "You are already following this user.";

#[derive(Clone)]
pub struct FollowService {
    store: Arc<dyn BlogStore>,
}

impl FollowService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Make `follower` follow the user called `target_username`.
    ///
    /// The follower is always the acting principal, never a value taken from
    /// the request body.
    #[tracing::instrument(skip(self, follower), fields(follower = %follower.username))]
    pub async fn follow(&self, follower: &User, target_username: &str) -> AppResult<Follow> {
        let target = self
            .store
            .get_user_by_username(target_username)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "following: Object with username={} does not exist.",
                    target_username
                ))
            })?;

        check_not_self(follower.id, target.id)?;

        if self.store.follow_exists(follower.id, target.id).await? {
            tracing::debug!("Rejected duplicate follow");
            return Err(AppError::Validation(DUPLICATE_FOLLOW_MESSAGE.to_string()));
        }

        // A concurrent request may have inserted the same pair in between
        let follow = self
            .store
            .create_follow(follower.id, target.id)
            .await?
            .ok_or_else(|| AppError::Validation(DUPLICATE_FOLLOW_MESSAGE.to_string()))?;

        tracing::info!(following = %follow.following, "Follow created");
        Ok(follow)
    }

    pub async fn list(&self, follower: &User, search: Option<&str>) -> AppResult<Vec<Follow>> {
        self.store.list_follows(follower.id, search).await
    }
}

fn check_not_self(user: UserId, following: UserId) -> AppResult<()> {
    if user == following {
        tracing::debug!(user, "Rejected self-follow");
        return Err(AppError::Validation(SELF_FOLLOW_MESSAGE.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDatabase;

    async fn setup() -> (FollowService, User, User) {
        let store = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let leo = store.create_user("leo").await.unwrap();
        let mia = store.create_user("mia").await.unwrap();
        (FollowService::new(store), leo, mia)
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_follow_persists_principal_as_user() {
        let (service, leo, mia) = setup().await;
        let follow = service.follow(&leo, &mia.username).await.unwrap();
        assert_eq!(follow.user_id, leo.id);
        assert_eq!(follow.following_id, mia.id);
        assert_eq!(follow.user, "leo");
        assert_eq!(follow.following, "mia");
    }

    #[tokio::test]
    async fn test_self_follow_is_rejected() {
        let (service, leo, _) = setup().await;
        let err = service.follow(&leo, "leo").await.unwrap_err();
        assert_eq!(validation_message(err), SELF_FOLLOW_MESSAGE);
        assert!(service.list(&leo, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_follow_is_rejected() {
        let (service, leo, mia) = setup().await;
        service.follow(&leo, "mia").await.unwrap();
        let err = service.follow(&leo, "mia").await.unwrap_err();
        assert_eq!(validation_message(err), DUPLICATE_FOLLOW_MESSAGE);
        assert_eq!(service.list(&leo, None).await.unwrap().len(), 1);

        // The reverse edge is a different follow
        service.follow(&mia, "leo").await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_target_is_rejected() {
        let (service, leo, _) = setup().await;
        let err = service.follow(&leo, "ghost").await.unwrap_err();
        assert!(validation_message(err).contains("ghost"));
    }

    #[test]
    fn test_check_not_self() {
        assert!(check_not_self(1, 2).is_ok());
        assert!(check_not_self(3, 3).is_err());
    }
}
