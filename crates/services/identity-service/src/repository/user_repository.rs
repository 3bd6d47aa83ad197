//! User repository implementation with optimistic concurrency on update.

use async_trait::async_trait;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Select, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::User;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Restricts a lookup to users with a given status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Any,
    Only(i32),
}

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid, status: StatusFilter) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str, status: StatusFilter)
        -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str, status: StatusFilter) -> AppResult<Option<User>>;

    /// Exact match on the remember-me key
    async fn find_by_auth_key(&self, auth_key: &str, status: StatusFilter)
        -> AppResult<Option<User>>;

    /// Exact match on the stored reset token; expiry is the caller's concern
    async fn find_by_password_reset_token(
        &self,
        token: &str,
        status: StatusFilter,
    ) -> AppResult<Option<User>>;

    /// Whether another user (not `excluding`) already has this username
    async fn exists_with_username(&self, username: &str, excluding: Option<Uuid>) -> AppResult<bool>;

    /// Whether another user (not `excluding`) already has this email
    async fn exists_with_email(&self, email: &str, excluding: Option<Uuid>) -> AppResult<bool>;

    /// Insert a new user. Timestamps must already be set.
    async fn insert(&self, user: &User) -> AppResult<User>;

    /// Write every column of `user` in a single-row update, provided the
    /// stored `updated_at` still equals `expected_updated_at`.
    ///
    /// Returns `Conflict` if the row changed in between and `NotFound` if it
    /// no longer exists.
    async fn update(&self, user: &User, expected_updated_at: DateTime<Utc>) -> AppResult<User>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: Arc<DatabaseConnection>,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_one(
        &self,
        query: Select<UserEntity>,
        status: StatusFilter,
    ) -> AppResult<Option<User>> {
        let query = match status {
            StatusFilter::Any => query,
            StatusFilter::Only(status_id) => query.filter(user::Column::StatusId.eq(status_id)),
        };

        let result = query.one(self.db.as_ref()).await.map_err(AppError::from)?;
        Ok(result.map(User::from))
    }

    async fn taken(&self, query: Select<UserEntity>, excluding: Option<Uuid>) -> AppResult<bool> {
        let query = match excluding {
            Some(id) => query.filter(user::Column::Id.ne(id)),
            None => query,
        };

        let count = query.count(self.db.as_ref()).await.map_err(AppError::from)?;
        Ok(count > 0)
    }
}

/// Unique index violations mean a concurrent writer claimed the same
/// username, email or auth key first.
fn map_write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::warn!("Unique constraint violation on users: {}", detail);
            AppError::conflict("User already exists")
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid, status: StatusFilter) -> AppResult<Option<User>> {
        self.find_one(UserEntity::find_by_id(id), status).await
    }

    async fn find_by_username(
        &self,
        username: &str,
        status: StatusFilter,
    ) -> AppResult<Option<User>> {
        self.find_one(
            UserEntity::find().filter(user::Column::Username.eq(username)),
            status,
        )
        .await
    }

    async fn find_by_email(&self, email: &str, status: StatusFilter) -> AppResult<Option<User>> {
        self.find_one(UserEntity::find().filter(user::Column::Email.eq(email)), status)
            .await
    }

    async fn find_by_auth_key(
        &self,
        auth_key: &str,
        status: StatusFilter,
    ) -> AppResult<Option<User>> {
        self.find_one(
            UserEntity::find().filter(user::Column::AuthKey.eq(auth_key)),
            status,
        )
        .await
    }

    async fn find_by_password_reset_token(
        &self,
        token: &str,
        status: StatusFilter,
    ) -> AppResult<Option<User>> {
        self.find_one(
            UserEntity::find().filter(user::Column::PasswordResetToken.eq(token)),
            status,
        )
        .await
    }

    async fn exists_with_username(&self, username: &str, excluding: Option<Uuid>) -> AppResult<bool> {
        self.taken(
            UserEntity::find().filter(user::Column::Username.eq(username)),
            excluding,
        )
        .await
    }

    async fn exists_with_email(&self, email: &str, excluding: Option<Uuid>) -> AppResult<bool> {
        self.taken(UserEntity::find().filter(user::Column::Email.eq(email)), excluding)
            .await
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        let model = ActiveModel::from(user)
            .insert(self.db.as_ref())
            .await
            .map_err(map_write_error)?;
        Ok(User::from(model))
    }

    async fn update(&self, user: &User, expected_updated_at: DateTime<Utc>) -> AppResult<User> {
        let result = UserEntity::update_many()
            .set(ActiveModel::from(user))
            .filter(user::Column::Id.eq(user.id))
            .filter(user::Column::UpdatedAt.eq(expected_updated_at))
            .exec(self.db.as_ref())
            .await
            .map_err(map_write_error)?;

        if result.rows_affected == 0 {
            let exists = UserEntity::find_by_id(user.id)
                .one(self.db.as_ref())
                .await
                .map_err(AppError::from)?
                .is_some();

            return Err(if exists {
                tracing::warn!(user_id = %user.id, "Rejected stale user update");
                AppError::conflict("User was modified concurrently")
            } else {
                AppError::NotFound
            });
        }

        Ok(user.clone())
    }
}
