// ViewerContext Extractor - ergonomic access to the request's viewer in handlers

use std::sync::Arc;

use crate::error::AppError;
use crate::infrastructure::viewer::ViewerContext;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Cheap-to-clone handle on the current request's ViewerContext.
///
/// Derefs to `ViewerContext`, so handlers read `vc.user_id()` and friends
/// directly.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl Vc {
    pub fn new(vc: Arc<ViewerContext>) -> Self {
        Self(vc)
    }

    pub fn arc(self) -> Arc<ViewerContext> {
        self.0
    }
}

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<ViewerContext> for Vc {
    fn as_ref(&self) -> &ViewerContext {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or_else(|| {
                AppError::Internal("ViewerContext missing; is the middleware installed?".to_string())
            })
    }
}
