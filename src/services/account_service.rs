//! Account service - Entry point of the account views for the HTTP layer.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::account_support::{AccountSupport, AccountViewData, ViewName};
use super::account_views::{
    submit, AccountListing, Create, Delete, Edit, List, Submission, ViewContext,
};
use crate::domain::User;
use crate::errors::{AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Account management use cases.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Every account with the total count
    async fn list(&self) -> AppResult<AccountListing>;

    /// Account by id
    async fn get(&self, id: Uuid) -> AppResult<User>;

    /// Data needed to render one of the account forms
    async fn view_data(
        &self,
        view: ViewName,
        actor: &User,
        target: Option<&User>,
    ) -> AppResult<AccountViewData>;

    /// Submit the creation form
    async fn create(&self, ctx: &mut ViewContext) -> AppResult<Submission>;

    /// Submit the edition form of an account
    async fn edit(&self, id: Uuid, ctx: &mut ViewContext) -> AppResult<Submission>;

    /// Delete an account
    async fn delete(&self, id: Uuid, ctx: &mut ViewContext) -> AppResult<Submission>;

    /// Account matching a login/password pair
    async fn by_credentials(&self, login: &str, password: &str) -> AppResult<Option<User>>;

    /// Check connectivity of the persistence layer
    async fn ping(&self) -> AppResult<()>;
}

/// Concrete implementation of AccountService using Unit of Work.
pub struct AccountManager<U: UnitOfWork> {
    support: Arc<AccountSupport<U>>,
    list: List<U>,
    create: Create<U>,
    edit: Edit<U>,
    delete: Delete<U>,
}

impl<U: UnitOfWork> AccountManager<U> {
    pub fn new(support: Arc<AccountSupport<U>>) -> Self {
        Self {
            list: List::new(support.clone()),
            create: Create::new(support.clone()),
            edit: Edit::new(support.clone()),
            delete: Delete::new(support.clone()),
            support,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> AccountService for AccountManager<U> {
    async fn list(&self) -> AppResult<AccountListing> {
        self.list.render().await
    }

    async fn get(&self, id: Uuid) -> AppResult<User> {
        self.support.users().find_by_id(id).await?.ok_or_not_found()
    }

    async fn view_data(
        &self,
        view: ViewName,
        actor: &User,
        target: Option<&User>,
    ) -> AppResult<AccountViewData> {
        self.support.update_view(view, Some(actor), target).await
    }

    async fn create(&self, ctx: &mut ViewContext) -> AppResult<Submission> {
        submit(&self.create, ctx, User::new("")).await
    }

    async fn edit(&self, id: Uuid, ctx: &mut ViewContext) -> AppResult<Submission> {
        let account = self.get(id).await?;
        submit(&self.edit, ctx, account).await
    }

    async fn delete(&self, id: Uuid, ctx: &mut ViewContext) -> AppResult<Submission> {
        let account = self.get(id).await?;
        submit(&self.delete, ctx, account).await
    }

    async fn by_credentials(&self, login: &str, password: &str) -> AppResult<Option<User>> {
        self.support
            .by_credentials(login, password, self.support.uses_ldap())
            .await
    }

    async fn ping(&self) -> AppResult<()> {
        self.support.ping().await
    }
}
