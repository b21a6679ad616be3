//! Authentication service - Handles login and token verification.
//!
//! Credentials are checked through the account service so directory-backed
//! accounts authenticate against LDAP when it is enabled.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::AccountService;
use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::User;
use crate::errors::{AppError, AppResult};

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub login: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Login and return JWT token
    async fn login(&self, login: String, password: String) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        login: user.login.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    accounts: Arc<dyn AccountService>,
    config: Config,
}

impl Authenticator {
    pub fn new(accounts: Arc<dyn AccountService>, config: Config) -> Self {
        Self { accounts, config }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn login(&self, login: String, password: String) -> AppResult<TokenResponse> {
        let user = self
            .accounts
            .by_credentials(&login, &password)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        tracing::info!(login = %user.login, "User logged in");
        generate_token(&user, &self.config)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("an-adequately-long-secret-for-tests-only")
    }

    #[test]
    fn test_token_round_trip() {
        let config = config();
        let mut user = User::new("jdoe");
        user.role = crate::domain::UserRole::Manager;

        let token = generate_token(&user, &config).unwrap();
        assert_eq!(token.token_type, "Bearer");

        let claims = decode::<Claims>(
            &token.access_token,
            &DecodingKey::from_secret(config.jwt_secret_bytes()),
            &Validation::default(),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.login, "jdoe");
        assert_eq!(claims.role, "manager");
    }
}
