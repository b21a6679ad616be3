//! Group and membership repository.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::{
    group::{self, Entity as GroupEntity},
    user_group::{self, Entity as UserGroupEntity},
};
use crate::domain::Group;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Group repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// List all groups ordered by name
    async fn all(&self) -> AppResult<Vec<Group>>;

    /// Find group by ID
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Group>>;

    /// Find group by name
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Group>>;

    /// Add a user to a group
    async fn attach(&self, user_id: Uuid, group_id: i32) -> AppResult<()>;

    /// Remove a user from a group
    async fn detach(&self, user_id: Uuid, group_id: i32) -> AppResult<()>;
}

/// Concrete implementation of GroupRepository.
///
/// Runs on a plain connection or on an open transaction.
pub struct GroupStore<C = DatabaseConnection> {
    db: Arc<C>,
}

impl<C: ConnectionTrait> GroupStore<C> {
    /// Create new repository instance
    pub fn new(db: Arc<C>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<C: ConnectionTrait + Send + Sync + 'static> GroupRepository for GroupStore<C> {
    async fn all(&self) -> AppResult<Vec<Group>> {
        let models = GroupEntity::find()
            .order_by_asc(group::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(models.into_iter().map(Group::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Group>> {
        let model = GroupEntity::find_by_id(id).one(&*self.db).await?;
        Ok(model.map(Group::from))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        let model = GroupEntity::find()
            .filter(group::Column::Name.eq(name))
            .one(&*self.db)
            .await?;
        Ok(model.map(Group::from))
    }

    async fn attach(&self, user_id: Uuid, group_id: i32) -> AppResult<()> {
        user_group::ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group_id),
        }
        .insert(&*self.db)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn detach(&self, user_id: Uuid, group_id: i32) -> AppResult<()> {
        UserGroupEntity::delete_many()
            .filter(user_group::Column::UserId.eq(user_id))
            .filter(user_group::Column::GroupId.eq(group_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }
}
