// ViewerContext Middleware
// Creates ViewerContext from the Authorization header and injects it into request extensions

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    infrastructure::{database::BlogStore, security::TokenVerifier, viewer::ViewerContext},
    models::UserId,
};

const BEARER: &str = "Bearer";

/// Authentication information extracted from request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthInfo {
    Anonymous,
    Bearer(UserId),
}

/// Trait for application state that can resolve viewers
pub trait HasViewerServices {
    fn store(&self) -> &Arc<dyn BlogStore>;
    fn token_verifier(&self) -> &TokenVerifier;
}

/// ViewerContext middleware that creates request-scoped viewer context.
///
/// A missing header or a foreign scheme yields an anonymous viewer; a bearer
/// token that fails verification is rejected outright, even for reads.
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    T: HasViewerServices + Clone + Send + Sync + 'static,
{
    let auth_info = extract_auth_from_request(request.headers(), app_state.token_verifier())?;
    let viewer_context = create_viewer_context(auth_info, app_state.store().as_ref()).await?;

    tracing::debug!(
        request_id = %viewer_context.request_id,
        user_id = ?viewer_context.user_id(),
        "Resolved viewer"
    );

    request.extensions_mut().insert(viewer_context);
    Ok(next.run(request).await)
}

/// Extract authentication information from request headers
fn extract_auth_from_request(headers: &HeaderMap, verifier: &TokenVerifier) -> AppResult<AuthInfo> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(AuthInfo::Anonymous);
    };

    let auth_str = auth_header.to_str().map_err(|_| {
        AppError::Unauthorized("Authorization header contains invalid characters.".to_string())
    })?;

    let mut parts = auth_str.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme == BEARER => {}
        // Other schemes belong to someone else
        _ => return Ok(AuthInfo::Anonymous),
    }

    let token = match (parts.next(), parts.next()) {
        (Some(token), None) => token,
        _ => {
            return Err(AppError::Unauthorized(
                "Authorization header must contain two space-delimited values.".to_string(),
            ))
        }
    };

    verifier.verify(token).map(AuthInfo::Bearer)
}

/// Create appropriate ViewerContext based on authentication info
async fn create_viewer_context(
    auth_info: AuthInfo,
    store: &dyn BlogStore,
) -> AppResult<Arc<ViewerContext>> {
    let request_id = format!("req-{}", Uuid::new_v4());

    let viewer_context = match auth_info {
        AuthInfo::Anonymous => ViewerContext::anonymous(request_id),
        AuthInfo::Bearer(user_id) => {
            let user = store.get_user(user_id).await?.ok_or_else(|| {
                tracing::warn!(user_id, "Valid token for unknown user");
                AppError::Unauthorized("User not found.".to_string())
            })?;
            ViewerContext::authenticated_user(user, request_id)
        }
    };

    Ok(Arc::new(viewer_context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::infrastructure::security::Claims;
    use crate::infrastructure::sqlite_database::SqliteDatabase;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(&AuthConfig {
            jwt_secret: "secret".to_string(),
            leeway_secs: 0,
        })
    }

    fn token_for(user_id: UserId) -> String {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + 600,
            token_type: "access".to_string(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap()
    }

    #[test]
    fn test_extract_auth_bearer_token() {
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", token_for(1001));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&value).unwrap());

        let auth_info = extract_auth_from_request(&headers, &verifier()).unwrap();
        assert_eq!(auth_info, AuthInfo::Bearer(1001));
    }

    #[test]
    fn test_extract_auth_anonymous() {
        let headers = HeaderMap::new();
        let auth_info = extract_auth_from_request(&headers, &verifier()).unwrap();
        assert_eq!(auth_info, AuthInfo::Anonymous);
    }

    #[test]
    fn test_foreign_scheme_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic bGVvOnB3"));
        let auth_info = extract_auth_from_request(&headers, &verifier()).unwrap();
        assert_eq!(auth_info, AuthInfo::Anonymous);
    }

    #[test]
    fn test_bearer_without_token_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert!(matches!(
            extract_auth_from_request(&headers, &verifier()),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert!(matches!(
            extract_auth_from_request(&headers, &verifier()),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_viewer_context_for_unknown_user() {
        let store = SqliteDatabase::new_in_memory().await.unwrap();
        let err = create_viewer_context(AuthInfo::Bearer(99), &store).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_viewer_context_for_known_user() {
        let store = SqliteDatabase::new_in_memory().await.unwrap();
        let leo = store.create_user("leo").await.unwrap();
        let vc = create_viewer_context(AuthInfo::Bearer(leo.id), &store).await.unwrap();
        assert_eq!(vc.user_id(), Some(leo.id));
        assert!(vc.request_id.starts_with("req-"));

        let anon = create_viewer_context(AuthInfo::Anonymous, &store).await.unwrap();
        assert!(!anon.is_authenticated());
    }
}
