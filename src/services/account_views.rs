//! Account views.
//!
//! Each form view validates a submission, then saves it. `submit` drives
//! the two steps for any view; the account-specific behavior lives in
//! `Create`, `Edit` and `Delete`, which share an injected `AccountSupport`.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use super::account_support::{AccountSupport, ViewName};
use crate::config::{
    FLASH_ERROR_PREFIX, MSG_CURRENT_PASSWORD_INCORRECT, MSG_PASSWORDS_DO_NOT_MATCH,
    MSG_PASSWORD_UNCHANGED, ROUTE_LIST_ACCOUNT, ROUTE_LIST_REQUEST,
};
use crate::domain::{Password, User, UserResponse};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::types::{FormParams, Session};

/// Everything a view sees of the current request.
#[derive(Debug, Default)]
pub struct ViewContext {
    /// Authenticated user, if any
    pub actor: Option<User>,
    pub params: FormParams,
    pub session: Session,
}

impl ViewContext {
    pub fn new(actor: Option<User>, params: FormParams) -> Self {
        Self {
            actor,
            params,
            session: Session::default(),
        }
    }
}

/// Outcome of a submitted form.
#[derive(Debug)]
pub enum Submission {
    /// Saved; the client goes on to the named route
    Saved {
        account: User,
        redirect: &'static str,
    },
    /// Rejected by validation, nothing was persisted
    Invalid { errors: Vec<String> },
}

#[async_trait]
pub trait FormView: Send + Sync {
    fn name(&self) -> ViewName;

    /// Push messages for every problem found; true when there are none.
    async fn validate(
        &self,
        _ctx: &mut ViewContext,
        _account: &User,
        errors: &mut Vec<String>,
    ) -> AppResult<bool> {
        Ok(errors.is_empty())
    }

    /// Persist the submission and return the route to redirect to.
    async fn save_model(&self, ctx: &mut ViewContext, account: &mut User) -> AppResult<&'static str>;
}

/// Validate then save `account` through `view`.
pub async fn submit<V: FormView + ?Sized>(
    view: &V,
    ctx: &mut ViewContext,
    mut account: User,
) -> AppResult<Submission> {
    let mut errors = Vec::new();
    if !view.validate(ctx, &account, &mut errors).await? {
        debug!(view = view.name().as_str(), ?errors, "Form rejected");
        return Ok(Submission::Invalid { errors });
    }

    let redirect = view.save_model(ctx, &mut account).await?;
    Ok(Submission::Saved { account, redirect })
}

/// Non-admin users go back to their requests rather than the account list.
fn redirect_for(actor: Option<&User>) -> &'static str {
    match actor {
        Some(user) if !user.is_admin() => ROUTE_LIST_REQUEST,
        _ => ROUTE_LIST_ACCOUNT,
    }
}

/// Only admins pick memberships, like roles.
fn assigns_groups(actor: Option<&User>) -> bool {
    actor.is_some_and(User::is_admin)
}

/// Every account, for the listing page.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountListing {
    #[schema(example = 42)]
    pub user_count: u64,
    pub users: Vec<UserResponse>,
}

pub struct List<U: UnitOfWork> {
    support: Arc<AccountSupport<U>>,
}

impl<U: UnitOfWork> List<U> {
    pub fn new(support: Arc<AccountSupport<U>>) -> Self {
        Self { support }
    }

    pub async fn render(&self) -> AppResult<AccountListing> {
        let users = self.support.users();
        let user_count = users.count().await?;
        let users = users.list().await?.into_iter().map(UserResponse::from).collect();

        Ok(AccountListing { user_count, users })
    }
}

pub struct Create<U: UnitOfWork> {
    support: Arc<AccountSupport<U>>,
}

impl<U: UnitOfWork> Create<U> {
    pub fn new(support: Arc<AccountSupport<U>>) -> Self {
        Self { support }
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> FormView for Create<U> {
    fn name(&self) -> ViewName {
        ViewName::Create
    }

    async fn validate(
        &self,
        ctx: &mut ViewContext,
        _account: &User,
        errors: &mut Vec<String>,
    ) -> AppResult<bool> {
        if let (Some(password), Some(confirm)) = (
            ctx.params.get("user.password"),
            ctx.params.get("confirm_password"),
        ) {
            if password != confirm {
                errors.push(MSG_PASSWORDS_DO_NOT_MATCH.to_string());
            }
        }
        Ok(errors.is_empty())
    }

    async fn save_model(&self, ctx: &mut ViewContext, account: &mut User) -> AppResult<&'static str> {
        let support = &self.support;
        support.bind(&ctx.params, account, ctx.actor.as_ref())?;

        let ldap_password = if account.ldap_user {
            let password = ctx
                .params
                .get("ldappassword")
                .ok_or(AppError::MandatoryLdapPassword)?;
            Some(password.to_string())
        } else {
            None
        };
        let directory = if ldap_password.is_some() {
            Some(support.directory()?)
        } else {
            None
        };

        let defaults = FormParams::default();
        let groups = if assigns_groups(ctx.actor.as_ref()) {
            &ctx.params
        } else {
            &defaults
        };

        let tx = support.begin().await?;
        support.save_model(&*tx, account).await?;
        support.append_groups(&*tx, account, groups).await?;

        // Directory last: a rejected entry rolls the whole account back
        let mirrored = match (directory, ldap_password) {
            (Some(directory), Some(password)) => {
                let unit = ctx.params.get_non_empty("unit").map(str::to_string);
                let dn = directory.add_user(account, &password, unit).await?;
                account.dn = Some(dn.clone());
                Some((directory, dn))
            }
            _ => None,
        };

        let stored = async {
            if mirrored.is_some() {
                support.update_model(&*tx, account).await?;
            }
            tx.commit().await
        }
        .await;

        if let Err(e) = stored {
            if let Some((directory, dn)) = mirrored {
                warn!(login = %account.login, dn = %dn, error = %e, "Account not saved, removing its directory entry");
                if let Err(cleanup) = directory.delete_user(&dn).await {
                    error!(dn = %dn, error = %cleanup, "Failed to remove directory entry");
                }
            }
            return Err(e);
        }

        Ok(redirect_for(ctx.actor.as_ref()))
    }
}

pub struct Edit<U: UnitOfWork> {
    support: Arc<AccountSupport<U>>,
}

impl<U: UnitOfWork> Edit<U> {
    pub fn new(support: Arc<AccountSupport<U>>) -> Self {
        Self { support }
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> FormView for Edit<U> {
    fn name(&self) -> ViewName {
        ViewName::Edit
    }

    async fn validate(
        &self,
        ctx: &mut ViewContext,
        account: &User,
        errors: &mut Vec<String>,
    ) -> AppResult<bool> {
        let Some(current) = ctx.params.get_non_empty("current_password") else {
            return Ok(errors.is_empty());
        };
        let password = ctx.params.get("user.password").unwrap_or_default();
        let confirm = ctx.params.get("confirm_password").unwrap_or_default();

        let verified = self
            .support
            .by_credentials(&account.login, current, self.support.uses_ldap())
            .await?;
        if verified.is_none() {
            errors.push(MSG_CURRENT_PASSWORD_INCORRECT.to_string());
        } else if password == current {
            errors.push(MSG_PASSWORD_UNCHANGED.to_string());
        }
        if password != confirm {
            errors.push(MSG_PASSWORDS_DO_NOT_MATCH.to_string());
        }

        if !errors.is_empty() {
            ctx.session
                .flash(format!("{};{}", FLASH_ERROR_PREFIX, errors.join(",")));
        }
        Ok(errors.is_empty())
    }

    async fn save_model(&self, ctx: &mut ViewContext, account: &mut User) -> AppResult<&'static str> {
        let support = &self.support;
        support.bind(&ctx.params, account, ctx.actor.as_ref())?;

        let tx = support.begin().await?;
        support.update_model(&*tx, account).await?;
        if assigns_groups(ctx.actor.as_ref()) {
            support.append_groups(&*tx, account, &ctx.params).await?;
        } else if ctx.params.contains("groups") {
            debug!(login = %account.login, "Ignoring groups submitted by a non-admin");
        }

        if account.ldap_user {
            // bind stored the new hash already
            let password = ctx
                .params
                .get_non_empty("user.password")
                .map(|_| Password::from_hash(account.password_hash.clone()).to_directory_hash());
            let dn = support.directory()?.update_user(account, password).await?;

            if account.dn.as_deref() != Some(dn.as_str()) {
                info!(login = %account.login, dn = %dn, "Directory entry renamed");
                account.dn = Some(dn);
                support.update_model(&*tx, account).await?;
            }
        }

        tx.commit().await?;
        Ok(redirect_for(ctx.actor.as_ref()))
    }
}

pub struct Delete<U: UnitOfWork> {
    support: Arc<AccountSupport<U>>,
}

impl<U: UnitOfWork> Delete<U> {
    pub fn new(support: Arc<AccountSupport<U>>) -> Self {
        Self { support }
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> FormView for Delete<U> {
    fn name(&self) -> ViewName {
        ViewName::Delete
    }

    async fn save_model(&self, _ctx: &mut ViewContext, account: &mut User) -> AppResult<&'static str> {
        let support = &self.support;

        let mirror = if account.ldap_user {
            let dn = account.dn.clone().ok_or_else(|| {
                AppError::directory(format!("{} has no directory entry", account.login))
            })?;
            Some((support.directory()?, dn))
        } else {
            None
        };

        let tx = support.begin().await?;
        support.delete_model(&*tx, account).await?;

        if let Some((directory, dn)) = mirror {
            directory.delete_user(&dn).await?;
            info!(login = %account.login, dn = %dn, "Directory entry removed with account");
        }

        tx.commit().await?;
        Ok(ROUTE_LIST_ACCOUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_for_actor() {
        let mut admin = User::new("root");
        admin.role = crate::domain::UserRole::Admin;

        assert_eq!(redirect_for(None), ROUTE_LIST_ACCOUNT);
        assert_eq!(redirect_for(Some(&admin)), ROUTE_LIST_ACCOUNT);
        assert_eq!(redirect_for(Some(&User::new("jdoe"))), ROUTE_LIST_REQUEST);
    }

    #[test]
    fn test_only_admins_assign_groups() {
        let mut admin = User::new("root");
        admin.role = crate::domain::UserRole::Admin;
        let mut manager = User::new("boss");
        manager.role = crate::domain::UserRole::Manager;

        assert!(assigns_groups(Some(&admin)));
        assert!(!assigns_groups(Some(&manager)));
        assert!(!assigns_groups(None));
    }
}
