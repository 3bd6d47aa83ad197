//! Role, status and user type lookups.

use async_trait::async_trait;
use std::sync::Arc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::entities::{role, status, user_type};
use common::{AppError, AppResult};
use domain::{LookupEntry, LookupKind};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait LookupRepository: Send + Sync {
    /// All rows of one lookup table, ordered by value
    async fn list(&self, kind: LookupKind) -> AppResult<Vec<LookupEntry>>;

    /// The row whose value column equals `value`
    async fn find_by_value(&self, kind: LookupKind, value: i32) -> AppResult<Option<LookupEntry>>;
}

pub struct LookupStore {
    db: Arc<DatabaseConnection>,
}

impl LookupStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LookupRepository for LookupStore {
    async fn list(&self, kind: LookupKind) -> AppResult<Vec<LookupEntry>> {
        let entries: Vec<LookupEntry> = match kind {
            LookupKind::Role => role::Entity::find()
                .order_by_asc(role::Column::RoleValue)
                .all(self.db.as_ref())
                .await
                .map_err(AppError::from)?
                .into_iter()
                .map(LookupEntry::from)
                .collect(),
            LookupKind::Status => status::Entity::find()
                .order_by_asc(status::Column::StatusValue)
                .all(self.db.as_ref())
                .await
                .map_err(AppError::from)?
                .into_iter()
                .map(LookupEntry::from)
                .collect(),
            LookupKind::UserType => user_type::Entity::find()
                .order_by_asc(user_type::Column::UserTypeValue)
                .all(self.db.as_ref())
                .await
                .map_err(AppError::from)?
                .into_iter()
                .map(LookupEntry::from)
                .collect(),
        };

        Ok(entries)
    }

    async fn find_by_value(&self, kind: LookupKind, value: i32) -> AppResult<Option<LookupEntry>> {
        let entry = match kind {
            LookupKind::Role => role::Entity::find()
                .filter(role::Column::RoleValue.eq(value))
                .one(self.db.as_ref())
                .await
                .map_err(AppError::from)?
                .map(LookupEntry::from),
            LookupKind::Status => status::Entity::find()
                .filter(status::Column::StatusValue.eq(value))
                .one(self.db.as_ref())
                .await
                .map_err(AppError::from)?
                .map(LookupEntry::from),
            LookupKind::UserType => user_type::Entity::find()
                .filter(user_type::Column::UserTypeValue.eq(value))
                .one(self.db.as_ref())
                .await
                .map_err(AppError::from)?
                .map(LookupEntry::from),
        };

        Ok(entry)
    }
}
