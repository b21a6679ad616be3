//! Urlencoded form extractor keeping repeated keys.

use axum::{
    async_trait,
    extract::{rejection::FormRejection, FromRequest, Request},
    Form,
};

use crate::errors::AppError;
use crate::types::FormParams;

/// Form body as ordered key/value pairs, so multi-valued fields such as
/// `groups` survive extraction.
pub struct SubmittedForm(pub FormParams);

#[async_trait]
impl<S> FromRequest<S> for SubmittedForm
where
    S: Send + Sync,
    Form<Vec<(String, String)>>: FromRequest<S, Rejection = FormRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        Ok(SubmittedForm(FormParams::new(pairs)))
    }
}
