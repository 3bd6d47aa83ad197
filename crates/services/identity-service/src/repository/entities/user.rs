//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::User;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    #[sea_orm(unique)]
    pub auth_key: Option<String>,
    pub password_reset_token: Option<String>,
    pub status_id: i32,
    pub role_id: i32,
    pub user_type_id: i32,
    pub created_at: DateTimeUtc,
    /// Also the optimistic concurrency version
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            username: model.username,
            email: model.email,
            password_hash: model.password_hash,
            auth_key: model.auth_key,
            password_reset_token: model.password_reset_token,
            status_id: model.status_id,
            role_id: model.role_id,
            user_type_id: model.user_type_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Every column set, for inserts and full-row updates
impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            auth_key: Set(user.auth_key.clone()),
            password_reset_token: Set(user.password_reset_token.clone()),
            status_id: Set(user.status_id),
            role_id: Set(user.role_id),
            user_type_id: Set(user.user_type_id),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}
