//! Flash message handlers.

use axum::{
    extract::{Extension, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::errors::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct FlashMessages {
    /// Oldest first
    #[schema(example = json!(["error;passwords do not match"]))]
    pub messages: Vec<String>,
}

/// Create flash routes
pub fn flash_routes() -> Router<AppState> {
    Router::new().route("/", get(pop_flashes))
}

/// Pop the caller's pending flash messages
#[utoipa::path(
    get,
    path = "/flash",
    tag = "Flash",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending messages, now cleared", body = FlashMessages),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn pop_flashes(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<FlashMessages>> {
    let messages = state.flash.pop_all(&current_user.id().to_string()).await?;
    Ok(Json(FlashMessages { messages }))
}
