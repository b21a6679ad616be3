//! Group domain entity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Named permission bucket, many-to-many with users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Group {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "user")]
    pub name: String,
}

impl Group {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Membership changes turning one group set into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDelta {
    /// Currently attached, not wanted
    pub detach: Vec<i32>,
    /// Wanted, not attached yet; duplicates collapsed
    pub attach: Vec<i32>,
}

impl GroupDelta {
    pub fn between(current: &[i32], wanted: &[i32]) -> Self {
        let detach = current
            .iter()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect();

        let mut attach: Vec<i32> = Vec::new();
        for id in wanted {
            if !current.contains(id) && !attach.contains(id) {
                attach.push(*id);
            }
        }

        Self { detach, attach }
    }

    pub fn is_empty(&self) -> bool {
        self.detach.is_empty() && self.attach.is_empty()
    }
}
