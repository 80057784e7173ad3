use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    error::{AppError, Result},
    models::TokenPairResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    pub user_id: i64,
}

/// Signs and verifies HS256 access/refresh tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: lifetime("ACCESS_TOKEN_TTL_SECS", config.access_token_ttl_secs)?,
            refresh_ttl: lifetime("REFRESH_TOKEN_TTL_SECS", config.refresh_token_ttl_secs)?,
        })
    }

    pub fn issue_pair(&self, user_id: i64) -> Result<TokenPairResponse> {
        Ok(TokenPairResponse {
            access: self.issue(user_id, TokenType::Access)?,
            refresh: self.issue(user_id, TokenType::Refresh)?,
        })
    }

    pub fn issue(&self, user_id: i64, token_type: TokenType) -> Result<String> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?
            .timestamp()
            .max(0) as usize;

        let claims = Claims {
            token_type,
            exp: expiration,
            iat: now.timestamp() as usize,
            jti: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Token generation failed: {}", e)))
    }

    /// Checks signature, expiry and that the token is of the `expected` type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected token: {}", e);
                AppError::Unauthorized("Token is invalid or expired".to_string())
            })?;

        if claims.token_type != expected {
            return Err(AppError::Unauthorized("Token has wrong type".to_string()));
        }

        Ok(claims)
    }
}

/// Token lifetimes must be positive and representable as a `Duration`.
fn lifetime(name: &str, secs: i64) -> Result<Duration> {
    if secs <= 0 {
        return Err(AppError::ConfigError(format!("{} must be positive", name)));
    }

    Duration::try_seconds(secs)
        .ok_or_else(|| AppError::ConfigError(format!("{} is out of range", name)))
}
