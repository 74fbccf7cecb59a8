// Bearer token verification
// Tokens are minted by the external auth service; this side only checks them

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::models::UserId;

pub const ACCESS_TOKEN_TYPE: &str = "access";

/// JWT Claims for authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub iat: u64,    // Issued at
    pub exp: u64,    // Expires at
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    ACCESS_TOKEN_TYPE.to_string()
}

/// Verifies HS256 access tokens against the shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Check signature, expiry and token type, returning the subject's user id
    pub fn verify(&self, token: &str) -> AppResult<UserId> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token is expired.".to_string())
                }
                _ => AppError::Unauthorized("Token is invalid.".to_string()),
            }
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AppError::Unauthorized("Token has wrong type.".to_string()));
        }

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AppError::Unauthorized("Token contained no recognizable user identification.".to_string()))
    }
}
