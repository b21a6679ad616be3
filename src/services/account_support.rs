//! Shared behavior of the account views.
//!
//! `AccountSupport` is injected into every account view. It carries the
//! collaborators those views share, the auxiliary form data, group
//! reconciliation and the generic model operations.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    as_bool, is_valid_role, DEFAULT_GROUP_NAME, ROLE_MANAGER, SUPPORTED_COUNTRIES,
};
use crate::domain::{Group, GroupDelta, Password, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::{Directory, DirectoryManager, Transaction, UnitOfWork, UserRepository};
use crate::types::FormParams;

/// Which account form is being rendered or submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewName {
    Create,
    Edit,
    Delete,
}

impl ViewName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewName::Create => "create",
            ViewName::Edit => "edit",
            ViewName::Delete => "delete",
        }
    }
}

/// A selectable manager on the account form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ManagerOption {
    /// Account id, or directory DN when LDAP is enabled
    #[schema(example = "uid=boss,ou=People,dc=example,dc=com")]
    pub key: String,
    #[schema(example = "boss")]
    pub login: String,
    #[schema(example = "Big Boss")]
    pub name: String,
}

impl From<User> for ManagerOption {
    fn from(user: User) -> Self {
        Self {
            key: user.id.to_string(),
            name: user.name(),
            login: user.login,
        }
    }
}

impl From<DirectoryManager> for ManagerOption {
    fn from(manager: DirectoryManager) -> Self {
        Self {
            key: manager.dn,
            login: manager.login,
            name: manager.name,
        }
    }
}

/// Auxiliary data for rendering an account form.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct AccountViewData {
    pub groups: Vec<Group>,
    pub managers: Vec<ManagerOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
    /// One-time suggestion, never stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
    /// The acting user is looking at their own account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub myself: Option<bool>,
}

pub struct AccountSupport<U: UnitOfWork> {
    uow: Arc<U>,
    directory: Option<Arc<dyn Directory>>,
    use_ldap: bool,
}

impl<U: UnitOfWork> AccountSupport<U> {
    pub fn new(uow: Arc<U>, directory: Option<Arc<dyn Directory>>, use_ldap: bool) -> Self {
        Self {
            uow,
            directory,
            use_ldap,
        }
    }

    pub fn uses_ldap(&self) -> bool {
        self.use_ldap
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        self.uow.users()
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.uow.ping().await
    }

    /// Open the transaction a form submission writes through.
    pub async fn begin(&self) -> AppResult<Box<dyn Transaction>> {
        self.uow.begin().await
    }

    /// Configured directory, required by any LDAP-backed account.
    pub fn directory(&self) -> AppResult<&dyn Directory> {
        self.directory
            .as_deref()
            .ok_or_else(|| AppError::internal("LDAP directory is not configured"))
    }

    /// Gather the data every account form renders.
    pub async fn update_view(
        &self,
        view: ViewName,
        actor: Option<&User>,
        target: Option<&User>,
    ) -> AppResult<AccountViewData> {
        let mut data = AccountViewData {
            groups: self.uow.groups().all().await?,
            ..Default::default()
        };

        if !self.use_ldap {
            data.managers = self
                .users()
                .find_by_role(ROLE_MANAGER)
                .await?
                .into_iter()
                .map(ManagerOption::from)
                .collect();
            return Ok(data);
        }

        let directory = self.directory()?;
        data.managers = directory
            .list_manager()
            .await?
            .into_iter()
            .map(ManagerOption::from)
            .collect();
        data.units = Some(directory.list_ou().await?);
        data.countries = Some(SUPPORTED_COUNTRIES.iter().map(|c| c.to_string()).collect());

        let password = Password::generate_temporary();
        info!("temporary password generated: {}", password);
        data.password = Some(password);

        data.view_name = Some(view.as_str().to_string());
        data.myself = Some(matches!((actor, target), (Some(a), Some(t)) if a.id == t.id));

        Ok(data)
    }

    /// Make the account's groups exactly the submitted `groups` ids.
    ///
    /// Nothing is submitted: the account gets the default group only.
    pub async fn append_groups(
        &self,
        tx: &dyn Transaction,
        account: &mut User,
        params: &FormParams,
    ) -> AppResult<()> {
        let groups = tx.groups();

        let mut wanted = params
            .get_all("groups")
            .into_iter()
            .map(|raw| {
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| AppError::bad_request(format!("invalid group id: {}", raw)))
            })
            .collect::<AppResult<Vec<i32>>>()?;

        if wanted.is_empty() {
            let default = groups
                .find_by_name(DEFAULT_GROUP_NAME)
                .await?
                .ok_or_else(|| {
                    AppError::internal(format!("default group '{}' is missing", DEFAULT_GROUP_NAME))
                })?;
            wanted.push(default.id);
        }

        let delta = GroupDelta::between(&account.group_ids(), &wanted);
        if delta.is_empty() {
            return Ok(());
        }

        // Resolve every new group before touching the membership
        let mut added = Vec::with_capacity(delta.attach.len());
        for id in &delta.attach {
            let group = groups
                .find_by_id(*id)
                .await?
                .ok_or_else(|| AppError::bad_request(format!("unknown group: {}", id)))?;
            added.push(group);
        }

        for id in &delta.detach {
            groups.detach(account.id, *id).await?;
        }
        for group in &added {
            groups.attach(account.id, group.id).await?;
        }

        account.groups.retain(|g| !delta.detach.contains(&g.id));
        account.groups.extend(added);
        account.groups.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(
            login = %account.login,
            detached = ?delta.detach,
            attached = ?delta.attach,
            "Group membership reconciled"
        );
        Ok(())
    }

    /// Copy the submitted `user.*` fields onto an account.
    ///
    /// Absent fields are left untouched; an empty `user.password` keeps the
    /// current hash.
    pub fn bind(&self, params: &FormParams, account: &mut User, actor: Option<&User>) -> AppResult<()> {
        if let Some(login) = params.get("user.login") {
            account.login = login.trim().to_string();
        }
        if let Some(firstname) = params.get("user.firstname") {
            account.firstname = firstname.trim().to_string();
        }
        if let Some(lastname) = params.get("user.lastname") {
            account.lastname = lastname.trim().to_string();
        }
        if let Some(email) = params.get("user.email") {
            account.email = email.trim().to_string();
        }

        if let Some(role) = params.get_non_empty("user.role") {
            if actor.is_some_and(User::is_admin) {
                if !is_valid_role(role) {
                    return Err(AppError::bad_request(format!("invalid role: {}", role)));
                }
                account.role = UserRole::from(role);
            } else {
                debug!(login = %account.login, "Ignoring role submitted by a non-admin");
            }
        }

        if let Some(country) = params.get_non_empty("user.country") {
            if !SUPPORTED_COUNTRIES.contains(&country) {
                return Err(AppError::bad_request(format!("unsupported country: {}", country)));
            }
            account.country = country.to_string();
        }

        if let Some(manager) = params.get("user.manager_id") {
            account.manager_id = match manager.trim() {
                "" => None,
                raw => Some(
                    Uuid::parse_str(raw)
                        .map_err(|_| AppError::bad_request(format!("invalid manager id: {}", raw)))?,
                ),
            };
        }
        if let Some(manager_dn) = params.get("user.manager_dn") {
            account.manager_dn = Some(manager_dn.trim().to_string()).filter(|dn| !dn.is_empty());
        }

        if self.use_ldap {
            if let Some(flag) = params.get("user.ldap_user") {
                account.ldap_user = as_bool(flag);
            }
        }

        if let Some(password) = params.get_non_empty("user.password") {
            account.password_hash = Password::new(password)?.into_string();
        }

        account.touch();
        Ok(())
    }

    /// Insert a freshly bound account.
    pub async fn save_model(&self, tx: &dyn Transaction, account: &mut User) -> AppResult<()> {
        if account.login.is_empty() {
            return Err(AppError::validation("login is required"));
        }

        let users = tx.users();
        if users.find_by_login(&account.login).await?.is_some() {
            return Err(AppError::conflict(format!("User {}", account.login)));
        }

        *account = users.insert(account).await?;
        info!(id = %account.id, login = %account.login, "Account created");
        Ok(())
    }

    /// Persist an already bound account.
    pub async fn update_model(&self, tx: &dyn Transaction, account: &mut User) -> AppResult<()> {
        if account.login.is_empty() {
            return Err(AppError::validation("login is required"));
        }

        let users = tx.users();
        if let Some(other) = users.find_by_login(&account.login).await? {
            if other.id != account.id {
                return Err(AppError::conflict(format!("User {}", account.login)));
            }
        }

        *account = users.update(account).await?;
        info!(id = %account.id, login = %account.login, "Account updated");
        Ok(())
    }

    /// Remove an account and its memberships.
    pub async fn delete_model(&self, tx: &dyn Transaction, account: &User) -> AppResult<()> {
        tx.users().delete(account.id).await?;
        info!(id = %account.id, login = %account.login, "Account deleted");
        Ok(())
    }

    /// Look up an account by login and check its password.
    ///
    /// LDAP-backed accounts bind against the directory when `use_ldap` is
    /// set, every other account is checked against its stored hash.
    pub async fn by_credentials(
        &self,
        login: &str,
        password: &str,
        use_ldap: bool,
    ) -> AppResult<Option<User>> {
        let Some(user) = self.users().find_by_login(login).await? else {
            return Ok(None);
        };

        let valid = if use_ldap && user.ldap_user {
            self.directory()?.authenticate(login, password).await?
        } else {
            Password::from_hash(user.password_hash.clone()).verify(password)
        };

        Ok(valid.then_some(user))
    }
}
