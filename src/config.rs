use serde::{Deserialize, Serialize};
use std::env;

const DEV_JWT_SECRET: &str = "insecure-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Clock skew tolerated when checking `exp`, in seconds.
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET is not set, falling back to the development secret");
            DEV_JWT_SECRET.to_string()
        });

        let pagination = PaginationConfig {
            default_limit: parse_var("PAGE_DEFAULT_LIMIT", 10),
            max_limit: parse_var("PAGE_MAX_LIMIT", 100),
        };
        if pagination.default_limit == 0 || pagination.default_limit > pagination.max_limit {
            anyhow::bail!(
                "PAGE_DEFAULT_LIMIT must be between 1 and PAGE_MAX_LIMIT ({})",
                pagination.max_limit
            );
        }

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/blog.db".to_string()),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 3000),
            },
            auth: AuthConfig {
                jwt_secret,
                leeway_secs: parse_var("JWT_LEEWAY_SECS", 0),
            },
            pagination,
        })
    }

    /// In-memory configuration used by tests and local tooling.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            auth: AuthConfig {
                jwt_secret: jwt_secret.into(),
                leeway_secs: 0,
            },
            pagination: PaginationConfig::default(),
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_defaults() {
        let config = Config::in_memory("secret");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 1);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.server_address(), "127.0.0.1:0");
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        env::set_var("BLOG_API_TEST_PORT", "not-a-number");
        assert_eq!(parse_var::<u16>("BLOG_API_TEST_PORT", 3000), 3000);
        env::set_var("BLOG_API_TEST_PORT", "8080");
        assert_eq!(parse_var::<u16>("BLOG_API_TEST_PORT", 3000), 8080);
        env::remove_var("BLOG_API_TEST_PORT");
    }
}
