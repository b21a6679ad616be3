//! Authentication handlers.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::TokenResponse;

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Account login
    #[validate(length(min = 1, message = "Login is required"))]
    #[schema(example = "jdoe")]
    pub login: String,
    /// Account password, checked against the directory for LDAP accounts
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .auth_service
        .login(payload.login, payload.password)
        .await?;

    Ok(Json(token))
}
