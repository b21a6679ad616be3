//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::User;
use crate::errors::AppError;

/// Account of the caller, loaded from the token subject
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    /// Check if user has admin role.
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// JWT authentication middleware.
///
/// Validates the bearer token, loads the matching account and injects it
/// as `CurrentUser` into the request extensions. A token whose account no
/// longer exists is rejected.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let claims = state.auth_service.verify_token(token)?;

    let user = state.accounts.get(claims.sub).await.map_err(|e| match e {
        AppError::NotFound => AppError::Unauthorized,
        other => other,
    })?;

    request.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(request).await)
}

/// Require admin role, returns Forbidden error if not admin.
pub fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Require manager or admin role.
pub fn require_manager(user: &CurrentUser) -> Result<(), AppError> {
    if user.user.role.is_manager() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Allow the account owner and admins.
pub fn require_self_or_admin(user: &CurrentUser, id: Uuid) -> Result<(), AppError> {
    if user.id() == id {
        Ok(())
    } else {
        require_admin(user)
    }
}
