//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{account_handler, auth_handler, flash_handler};
use crate::domain::{Group, UserResponse, UserRole};
use crate::infra::DirectoryManager;
use crate::services::{AccountListing, AccountViewData, ManagerOption, TokenResponse};
use crate::types::FormErrors;

/// OpenAPI documentation for the account management API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vacation accounts",
        version = "0.1.0",
        description = "Account management of the vacation tracker, with optional LDAP mirroring"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::login,
        // Account endpoints
        account_handler::list_accounts,
        account_handler::new_account,
        account_handler::create_account,
        account_handler::get_account,
        account_handler::edit_account,
        account_handler::confirm_delete,
        account_handler::delete_account,
        // Flash endpoints
        flash_handler::pop_flashes,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            UserResponse,
            Group,
            DirectoryManager,
            // Auth types
            auth_handler::LoginRequest,
            TokenResponse,
            // Account types
            AccountListing,
            AccountViewData,
            ManagerOption,
            account_handler::AccountForm,
            FormErrors,
            flash_handler::FlashMessages,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login"),
        (name = "Accounts", description = "Account creation, edition and deletion"),
        (name = "Flash", description = "Pending notifications")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
