use std::sync::Arc;

use crate::{
    config::Config,
    ent_framework::{create_default_privacy_registry, PrivacyRegistry},
    infrastructure::{
        database::BlogStore,
        middleware::HasViewerServices,
        pagination::LimitOffsetPagination,
        security::TokenVerifier,
        sqlite_database::SqliteDatabase,
    },
    services::FollowService,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub tokens: TokenVerifier,
    pub privacy: Arc<PrivacyRegistry>,
    pub pagination: LimitOffsetPagination,
    pub follows: FollowService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let database = SqliteDatabase::connect(&config.database).await?;
        Ok(Self::with_store(config, Arc::new(database)))
    }

    /// Assemble state around an already opened store
    pub fn with_store(config: Config, store: Arc<dyn BlogStore>) -> Self {
        Self {
            tokens: TokenVerifier::new(&config.auth),
            privacy: Arc::new(create_default_privacy_registry()),
            pagination: LimitOffsetPagination::new(&config.pagination),
            follows: FollowService::new(store.clone()),
            store,
            config,
        }
    }
}

impl HasViewerServices for AppState {
    fn store(&self) -> &Arc<dyn BlogStore> {
        &self.store
    }

    fn token_verifier(&self) -> &TokenVerifier {
        &self.tokens
    }
}
