//! Profile lookups.

use async_trait::async_trait;
use std::sync::Arc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::entities::profile;
use common::{AppError, AppResult};
use domain::Profile;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Profile>>;
}

pub struct ProfileStore {
    db: Arc<DatabaseConnection>,
}

impl ProfileStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileRepository for ProfileStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let result = profile::Entity::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Profile::from))
    }
}
