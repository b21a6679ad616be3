use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

/// Rejected form submission
#[derive(Debug, Serialize, ToSchema)]
pub struct FormErrors {
    /// Validation messages, in the order they were raised
    #[schema(example = json!(["passwords do not match"]))]
    pub errors: Vec<String>,
}

impl IntoResponse for FormErrors {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
