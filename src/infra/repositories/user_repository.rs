//! User repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::entities::{
    group::Entity as GroupEntity,
    user::{self, ActiveModel, Entity as UserEntity},
    user_group::{self, Entity as UserGroupEntity},
};
use crate::domain::{Group, User};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Users returned by queries carry their current groups.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Count all users
    async fn count(&self) -> AppResult<u64>;

    /// List all users ordered by login
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by login
    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>>;

    /// List users holding the given role
    async fn find_by_role(&self, role: &str) -> AppResult<Vec<User>>;

    /// Insert a new user (groups are not written)
    async fn insert(&self, user: &User) -> AppResult<User>;

    /// Write every column of an existing user (groups are not written)
    async fn update(&self, user: &User) -> AppResult<User>;

    /// Permanently delete a user and its memberships
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of UserRepository.
///
/// Runs on a plain connection or on an open transaction.
pub struct UserStore<C = DatabaseConnection> {
    db: Arc<C>,
}

impl<C: ConnectionTrait> UserStore<C> {
    /// Create new repository instance
    pub fn new(db: Arc<C>) -> Self {
        Self { db }
    }

    /// Load the groups of a set of users in two queries.
    async fn groups_by_user(&self, user_ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, Vec<Group>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = UserGroupEntity::find()
            .filter(user_group::Column::UserId.is_in(user_ids))
            .all(&*self.db)
            .await?;

        let groups: HashMap<i32, Group> = GroupEntity::find()
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|g| (g.id, Group::from(g)))
            .collect();

        let mut by_user: HashMap<Uuid, Vec<Group>> = HashMap::new();
        for link in links {
            if let Some(group) = groups.get(&link.group_id) {
                by_user.entry(link.user_id).or_default().push(group.clone());
            }
        }
        for list in by_user.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(by_user)
    }

    async fn attach_groups(&self, models: Vec<user::Model>) -> AppResult<Vec<User>> {
        let mut groups = self
            .groups_by_user(models.iter().map(|m| m.id).collect())
            .await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let own = groups.remove(&m.id).unwrap_or_default();
                m.into_domain(own)
            })
            .collect())
    }

    async fn attach_one(&self, model: Option<user::Model>) -> AppResult<Option<User>> {
        match model {
            Some(model) => Ok(self.attach_groups(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<C: ConnectionTrait + Send + Sync + 'static> UserRepository for UserStore<C> {
    async fn count(&self) -> AppResult<u64> {
        UserEntity::find()
            .count(&*self.db)
            .await
            .map_err(AppError::from)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::Login)
            .all(&*self.db)
            .await?;

        self.attach_groups(models).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(&*self.db).await?;
        self.attach_one(model).await
    }

    async fn find_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Login.eq(login))
            .one(&*self.db)
            .await?;
        self.attach_one(model).await
    }

    async fn find_by_role(&self, role: &str) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(user::Column::Role.eq(role))
            .order_by_asc(user::Column::Login)
            .all(&*self.db)
            .await?;

        self.attach_groups(models).await
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        let model = ActiveModel::from(user).insert(&*self.db).await?;
        Ok(model.into_domain(user.groups.clone()))
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let model = ActiveModel::from(user)
            .update(&*self.db)
            .await
            .map_err(|e| match e {
                sea_orm::DbErr::RecordNotUpdated => AppError::NotFound,
                other => AppError::from(other),
            })?;
        Ok(model.into_domain(user.groups.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        UserGroupEntity::delete_many()
            .filter(user_group::Column::UserId.eq(id))
            .exec(&*self.db)
            .await?;

        let result = UserEntity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
