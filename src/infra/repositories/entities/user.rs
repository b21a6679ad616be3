//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Group, User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub login: String,
    pub password_hash: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: String,
    pub manager_id: Option<Uuid>,
    pub manager_dn: Option<String>,
    pub country: String,
    pub ldap_user: bool,
    pub dn: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_group::Entity")]
    UserGroup,
}

impl Related<super::user_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Convert to the domain entity with its already loaded groups
    pub fn into_domain(self, groups: Vec<Group>) -> User {
        User {
            id: self.id,
            login: self.login,
            password_hash: self.password_hash,
            firstname: self.firstname,
            lastname: self.lastname,
            email: self.email,
            role: UserRole::from(self.role.as_str()),
            manager_id: self.manager_id,
            manager_dn: self.manager_dn,
            country: self.country,
            ldap_user: self.ldap_user,
            dn: self.dn,
            groups,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Every column set from the domain entity (memberships live elsewhere)
impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: Set(user.id),
            login: Set(user.login.clone()),
            password_hash: Set(user.password_hash.clone()),
            firstname: Set(user.firstname.clone()),
            lastname: Set(user.lastname.clone()),
            email: Set(user.email.clone()),
            role: Set(user.role.to_string()),
            manager_id: Set(user.manager_id),
            manager_dn: Set(user.manager_dn.clone()),
            country: Set(user.country.clone()),
            ldap_user: Set(user.ldap_user),
            dn: Set(user.dn.clone()),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}
