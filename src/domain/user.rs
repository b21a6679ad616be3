//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::group::Group;
use crate::config::{DEFAULT_COUNTRY, ROLE_ADMIN, ROLE_MANAGER, ROLE_USER};

/// User roles enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Manager,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Check if this role can manage other accounts' requests
    pub fn is_manager(&self) -> bool {
        matches!(self, UserRole::Manager | UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            ROLE_MANAGER => UserRole::Manager,
            _ => UserRole::User,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::Manager => write!(f, "{}", ROLE_MANAGER),
            UserRole::User => write!(f, "{}", ROLE_USER),
        }
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: UserRole,
    /// Manager picked among local accounts
    pub manager_id: Option<Uuid>,
    /// Manager picked among directory entries
    pub manager_dn: Option<String>,
    pub country: String,
    /// Account is mirrored in the LDAP directory
    pub ldap_user: bool,
    /// Distinguished name of the directory entry, once created
    pub dn: Option<String>,
    pub groups: Vec<Group>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, not yet persisted, user with default role and country
    pub fn new(login: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            login: login.into(),
            password_hash: String::new(),
            firstname: String::new(),
            lastname: String::new(),
            email: String::new(),
            role: UserRole::User,
            manager_id: None,
            manager_dn: None,
            country: DEFAULT_COUNTRY.to_string(),
            ldap_user: false,
            dn: None,
            groups: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Display name, falling back to the login
    pub fn name(&self) -> String {
        let name = format!("{} {}", self.firstname, self.lastname);
        let name = name.trim();
        if name.is_empty() {
            self.login.clone()
        } else {
            name.to_string()
        }
    }

    /// Identifiers of the groups the user belongs to
    pub fn group_ids(&self) -> Vec<i32> {
        self.groups.iter().map(|g| g.id).collect()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Account response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "jdoe")]
    pub login: String,
    #[schema(example = "John")]
    pub firstname: String,
    #[schema(example = "Doe")]
    pub lastname: String,
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = "fr")]
    pub country: String,
    pub manager_id: Option<Uuid>,
    pub manager_dn: Option<String>,
    pub ldap_user: bool,
    pub dn: Option<String>,
    /// Names of the groups the account belongs to
    pub groups: Vec<String>,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            role: user.role.to_string(),
            country: user.country,
            manager_id: user.manager_id,
            manager_dn: user.manager_dn,
            ldap_user: user.ldap_user,
            dn: user.dn,
            groups: user.groups.into_iter().map(|g| g.name).collect(),
            created_at: user.created_at,
        }
    }
}
