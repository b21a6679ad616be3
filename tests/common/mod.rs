//! In-memory stand-ins for the database, the directory and the flash store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use vacation_accounts::domain::{Group, Password, User, UserRole};
use vacation_accounts::errors::{AppError, AppResult};
use vacation_accounts::infra::{
    Directory, DirectoryManager, FlashStore, GroupRepository, Transaction, UnitOfWork,
    UserRepository,
};
use vacation_accounts::services::AccountSupport;
use vacation_accounts::types::FormParams;

pub const ADMIN_GROUP: i32 = 1;
pub const MANAGER_GROUP: i32 = 2;
pub const USER_GROUP: i32 = 3;

/// Rows shared by the user and group repositories.
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    groups: Vec<Group>,
    memberships: Mutex<Vec<(Uuid, i32)>>,
}

impl MemoryStore {
    /// Store holding the groups every deployment starts with
    pub fn seeded() -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(Vec::new()),
            groups: vec![
                Group::new(ADMIN_GROUP, "admin"),
                Group::new(MANAGER_GROUP, "manager"),
                Group::new(USER_GROUP, "user"),
            ],
            memberships: Mutex::new(Vec::new()),
        })
    }

    /// Insert an account directly, with a local password and memberships
    pub fn add_user(&self, login: &str, role: UserRole, password: &str, groups: &[i32]) -> User {
        let mut user = User::new(login);
        user.role = role;
        user.password_hash = Password::new(password).unwrap().into_string();
        self.users.lock().unwrap().push(User {
            groups: Vec::new(),
            ..user.clone()
        });
        for id in groups {
            self.memberships.lock().unwrap().push((user.id, *id));
        }
        self.with_groups(user)
    }

    /// Flag an account as mirrored in the directory, under `dn` when known
    pub fn link_directory(&self, id: Uuid, dn: Option<&str>) -> User {
        let mut users = self.users.lock().unwrap();
        let row = users.iter_mut().find(|u| u.id == id).unwrap();
        row.ldap_user = true;
        row.dn = dn.map(str::to_string);
        let user = row.clone();
        drop(users);
        self.with_groups(user)
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        let user = self.users.lock().unwrap().iter().find(|u| u.id == id).cloned();
        user.map(|u| self.with_groups(u))
    }

    pub fn user_by_login(&self, login: &str) -> Option<User> {
        let user = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.login == login)
            .cloned();
        user.map(|u| self.with_groups(u))
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Sorted group ids of an account
    pub fn memberships_of(&self, id: Uuid) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .memberships
            .lock()
            .unwrap()
            .iter()
            .filter(|(user_id, _)| *user_id == id)
            .map(|(_, group_id)| *group_id)
            .collect();
        ids.sort();
        ids
    }

    /// Independent copy of the current rows
    fn snapshot(&self) -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(self.users.lock().unwrap().clone()),
            groups: self.groups.clone(),
            memberships: Mutex::new(self.memberships.lock().unwrap().clone()),
        })
    }

    fn overwrite_with(&self, other: &Self) {
        *self.users.lock().unwrap() = other.users.lock().unwrap().clone();
        *self.memberships.lock().unwrap() = other.memberships.lock().unwrap().clone();
    }

    fn with_groups(&self, mut user: User) -> User {
        let ids = self.memberships_of(user.id);
        user.groups = self
            .groups
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect();
        user.groups.sort_by(|a, b| a.name.cmp(&b.name));
        user
    }
}

pub struct MemoryUsers(Arc<MemoryStore>);

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn count(&self) -> AppResult<u64> {
        Ok(self.0.user_count() as u64)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users = self.0.users.lock().unwrap().clone();
        users.sort_by(|a, b| a.login.cmp(&b.login));
        Ok(users.into_iter().map(|u| self.0.with_groups(u)).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.0.user(id))
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        Ok(self.0.user_by_login(login))
    }

    async fn find_by_role(&self, role: &str) -> AppResult<Vec<User>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|u| u.role.to_string() == role)
            .collect())
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        self.0.users.lock().unwrap().push(User {
            groups: Vec::new(),
            ..user.clone()
        });
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut users = self.0.users.lock().unwrap();
        let row = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AppError::NotFound)?;
        *row = User {
            groups: Vec::new(),
            ..user.clone()
        };
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.0
            .memberships
            .lock()
            .unwrap()
            .retain(|(user_id, _)| *user_id != id);

        let mut users = self.0.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

pub struct MemoryGroups(Arc<MemoryStore>);

#[async_trait]
impl GroupRepository for MemoryGroups {
    async fn all(&self) -> AppResult<Vec<Group>> {
        let mut groups = self.0.groups.clone();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Group>> {
        Ok(self.0.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        Ok(self.0.groups.iter().find(|g| g.name == name).cloned())
    }

    async fn attach(&self, user_id: Uuid, group_id: i32) -> AppResult<()> {
        let mut memberships = self.0.memberships.lock().unwrap();
        if !memberships.contains(&(user_id, group_id)) {
            memberships.push((user_id, group_id));
        }
        Ok(())
    }

    async fn detach(&self, user_id: Uuid, group_id: i32) -> AppResult<()> {
        self.0
            .memberships
            .lock()
            .unwrap()
            .retain(|m| *m != (user_id, group_id));
        Ok(())
    }
}

pub struct MemoryUow {
    store: Arc<MemoryStore>,
}

impl MemoryUow {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUow {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(MemoryUsers(self.store.clone()))
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        Arc::new(MemoryGroups(self.store.clone()))
    }

    async fn begin(&self) -> AppResult<Box<dyn Transaction>> {
        Ok(Box::new(MemoryTx {
            staged: self.store.snapshot(),
            target: self.store.clone(),
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Writes land on a copy of the store, published on commit only.
pub struct MemoryTx {
    staged: Arc<MemoryStore>,
    target: Arc<MemoryStore>,
}

#[async_trait]
impl Transaction for MemoryTx {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(MemoryUsers(self.staged.clone()))
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        Arc::new(MemoryGroups(self.staged.clone()))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.target.overwrite_with(&self.staged);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    Add { login: String, unit: Option<String> },
    Update { login: String, password: Option<String> },
    Delete { dn: String },
}

/// Directory remembering every write it receives.
#[derive(Default)]
pub struct RecordingDirectory {
    calls: Mutex<Vec<DirectoryCall>>,
    passwords: Mutex<HashMap<String, String>>,
    reject_add: bool,
}

impl RecordingDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Directory refusing every new entry
    pub fn rejecting_adds() -> Arc<Self> {
        Arc::new(Self {
            reject_add: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_password(&self, login: &str, password: &str) {
        self.passwords
            .lock()
            .unwrap()
            .insert(login.to_string(), password.to_string());
    }
}

#[async_trait]
impl Directory for RecordingDirectory {
    async fn add_user(&self, account: &User, password: &str, unit: Option<String>) -> AppResult<String> {
        if self.reject_add {
            return Err(AppError::directory("entry already exists"));
        }
        self.calls.lock().unwrap().push(DirectoryCall::Add {
            login: account.login.clone(),
            unit: unit.clone(),
        });
        self.set_password(&account.login, password);
        Ok(format!(
            "uid={},ou={},dc=example,dc=com",
            account.login,
            unit.as_deref().unwrap_or("People")
        ))
    }

    async fn update_user(&self, account: &User, password: Option<String>) -> AppResult<String> {
        let dn = account
            .dn
            .as_deref()
            .ok_or_else(|| AppError::directory("no directory entry"))?;
        self.calls.lock().unwrap().push(DirectoryCall::Update {
            login: account.login.clone(),
            password,
        });

        let parent = dn.split_once(',').map(|(_, parent)| parent).unwrap_or_default();
        Ok(format!("uid={},{}", account.login, parent))
    }

    async fn delete_user(&self, dn: &str) -> AppResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(DirectoryCall::Delete { dn: dn.to_string() });
        Ok(())
    }

    async fn list_manager(&self) -> AppResult<Vec<DirectoryManager>> {
        Ok(vec![DirectoryManager {
            dn: "uid=boss,ou=People,dc=example,dc=com".to_string(),
            login: "boss".to_string(),
            name: "Big Boss".to_string(),
        }])
    }

    async fn list_ou(&self) -> AppResult<Vec<String>> {
        Ok(vec!["People".to_string(), "Sales".to_string()])
    }

    async fn authenticate(&self, login: &str, password: &str) -> AppResult<bool> {
        Ok(self.passwords.lock().unwrap().get(login).map(String::as_str) == Some(password))
    }
}

#[derive(Default)]
pub struct MemoryFlash {
    queues: Mutex<HashMap<String, Vec<String>>>,
}

#[async_trait]
impl FlashStore for MemoryFlash {
    async fn push(&self, session: &str, messages: Vec<String>) -> AppResult<()> {
        self.queues
            .lock()
            .unwrap()
            .entry(session.to_string())
            .or_default()
            .extend(messages);
        Ok(())
    }

    async fn pop_all(&self, session: &str) -> AppResult<Vec<String>> {
        Ok(self.queues.lock().unwrap().remove(session).unwrap_or_default())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Support over `store`, with LDAP enabled when a directory is given
pub fn support(
    store: &Arc<MemoryStore>,
    directory: Option<Arc<RecordingDirectory>>,
) -> Arc<AccountSupport<MemoryUow>> {
    let use_ldap = directory.is_some();
    let directory = directory.map(|d| d as Arc<dyn Directory>);
    Arc::new(AccountSupport::new(
        Arc::new(MemoryUow::new(store.clone())),
        directory,
        use_ldap,
    ))
}

pub fn form(pairs: &[(&str, &str)]) -> FormParams {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}
