//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod group;
pub mod user;
pub mod user_group;

// Re-exports for public API convenience
#[allow(unused_imports)]
pub use group::{ActiveModel as GroupActiveModel, Entity as GroupEntity, Model as GroupModel};
#[allow(unused_imports)]
pub use user::{ActiveModel as UserActiveModel, Entity as UserEntity, Model as UserModel};
#[allow(unused_imports)]
pub use user_group::{Entity as UserGroupEntity, Model as UserGroupModel};
