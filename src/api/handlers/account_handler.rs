//! Account handlers.
//!
//! Form submissions answer with a `303 See Other` to the next page, or
//! `400` with the validation messages.

use axum::{
    extract::{Extension, Path, State},
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extractors::SubmittedForm;
use crate::api::middleware::{require_admin, require_manager, require_self_or_admin, CurrentUser};
use crate::api::AppState;
use crate::config::route_path;
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::{AccountListing, AccountViewData, Submission, ViewContext, ViewName};
use crate::types::FormErrors;

/// An account with the data of the form it is shown in
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountForm {
    pub account: UserResponse,
    pub view: AccountViewData,
}

/// Create account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts))
        .route("/new", get(new_account).post(create_account))
        .route("/:id", get(get_account).post(edit_account))
        .route("/:id/delete", get(confirm_delete).post(delete_account))
}

/// Queue the view's flash messages for the caller, then answer.
async fn respond(
    state: &AppState,
    actor: &CurrentUser,
    mut ctx: ViewContext,
    submission: Submission,
) -> AppResult<Response> {
    let flashes = ctx.session.take_flashes();
    if !flashes.is_empty() {
        state.flash.push(&actor.id().to_string(), flashes).await?;
    }

    Ok(match submission {
        Submission::Saved { redirect, .. } => Redirect::to(route_path(redirect)).into_response(),
        Submission::Invalid { errors } => FormErrors { errors }.into_response(),
    })
}

/// List all accounts (admin only)
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Every account with the total count", body = AccountListing),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_accounts(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<AccountListing>> {
    require_admin(&current_user)?;
    Ok(Json(state.accounts.list().await?))
}

/// Data for the account creation form
#[utoipa::path(
    get,
    path = "/accounts/new",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Creation form data", body = AccountViewData),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin or manager only")
    )
)]
pub async fn new_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<AccountViewData>> {
    require_manager(&current_user)?;
    let view = state
        .accounts
        .view_data(ViewName::Create, &current_user.user, None)
        .await?;
    Ok(Json(view))
}

/// Submit the account creation form
///
/// Urlencoded body: `user.*` fields, repeated `groups`, `confirm_password`,
/// `ldappassword` and `unit`.
#[utoipa::path(
    post,
    path = "/accounts/new",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 303, description = "Account created, redirect to the next page"),
        (status = 400, description = "Rejected form", body = FormErrors),
        (status = 403, description = "Forbidden - Admin or manager only"),
        (status = 409, description = "Login already taken"),
        (status = 422, description = "Directory password missing for an LDAP account")
    )
)]
pub async fn create_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    SubmittedForm(params): SubmittedForm,
) -> AppResult<Response> {
    require_manager(&current_user)?;

    let mut ctx = ViewContext::new(Some(current_user.user.clone()), params);
    let submission = state.accounts.create(&mut ctx).await?;
    respond(&state, &current_user, ctx, submission).await
}

/// Account with its edition form data (own account or admin)
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account and edition form data", body = AccountForm),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Can only view own account unless admin"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AccountForm>> {
    require_self_or_admin(&current_user, id)?;
    account_form(&state, &current_user, id, ViewName::Edit).await
}

/// Submit the account edition form (own account or admin)
///
/// Urlencoded body: `user.*` fields, repeated `groups`, `current_password`
/// and `confirm_password`.
#[utoipa::path(
    post,
    path = "/accounts/{id}",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 303, description = "Account updated, redirect to the next page"),
        (status = 400, description = "Rejected form", body = FormErrors),
        (status = 403, description = "Forbidden - Can only edit own account unless admin"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn edit_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    SubmittedForm(params): SubmittedForm,
) -> AppResult<Response> {
    require_self_or_admin(&current_user, id)?;

    let mut ctx = ViewContext::new(Some(current_user.user.clone()), params);
    let submission = state.accounts.edit(id, &mut ctx).await?;
    respond(&state, &current_user, ctx, submission).await
}

/// Account about to be deleted (admin only)
#[utoipa::path(
    get,
    path = "/accounts/{id}/delete",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account and deletion form data", body = AccountForm),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn confirm_delete(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AccountForm>> {
    require_admin(&current_user)?;
    account_form(&state, &current_user, id, ViewName::Delete).await
}

/// Delete an account and its directory entry (admin only)
#[utoipa::path(
    post,
    path = "/accounts/{id}/delete",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 303, description = "Account deleted, redirect to the account list"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Account not found"),
        (status = 502, description = "Directory error")
    )
)]
pub async fn delete_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    require_admin(&current_user)?;

    let mut ctx = ViewContext::new(Some(current_user.user.clone()), Default::default());
    let submission = state.accounts.delete(id, &mut ctx).await?;
    respond(&state, &current_user, ctx, submission).await
}

async fn account_form(
    state: &AppState,
    current_user: &CurrentUser,
    id: Uuid,
    view: ViewName,
) -> AppResult<Json<AccountForm>> {
    let account = state.accounts.get(id).await?;
    let view = state
        .accounts
        .view_data(view, &current_user.user, Some(&account))
        .await?;

    Ok(Json(AccountForm {
        account: UserResponse::from(account),
        view,
    }))
}
