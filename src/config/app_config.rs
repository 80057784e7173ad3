use crate::error::{AppError, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub bootstrap_user: Option<BootstrapUser>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

#[derive(Clone)]
pub struct BootstrapUser {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapUser")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("PORT", "3000")?,
                max_body_size: parse_var("MAX_BODY_SIZE", "1048576")?,
            },
            database: DatabaseConfig {
                url: env::var("DB_URL")
                    .map_err(|_| AppError::ConfigError("DB_URL not set".to_string()))?,
                max_connections: parse_var("DB_MAX_CONNECTIONS", "20")?,
                acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECS", "5")?,
            },
            cors: CorsConfig {
                allowed_origins: env::var("FRONTEND_URL")
                    .unwrap_or_default()
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .map_err(|_| AppError::ConfigError("JWT_SECRET not set".to_string()))?,
                access_token_ttl_secs: parse_var("ACCESS_TOKEN_TTL_SECS", "300")?,
                refresh_token_ttl_secs: parse_var("REFRESH_TOKEN_TTL_SECS", "86400")?,
            },
            bootstrap_user: match (env::var("BOOTSTRAP_USERNAME"), env::var("BOOTSTRAP_PASSWORD")) {
                (Ok(username), Ok(password)) => Some(BootstrapUser { username, password }),
                _ => None,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid {} value", name)))
}
