//! Identity Service Library
//!
//! User identities backed by PostgreSQL: lookups by id, remember-me key,
//! username and password reset token, plus registration and the credential
//! flows built on them. The binary in `main.rs` drives it from the command line.

pub mod commands;
pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use sea_orm::DbErr;

use crate::config::IdentityServiceConfig;
use crate::infra::Database;
use crate::repository::{LookupStore, ProfileStore, UserStore};
use crate::service::IdentityManager;

pub use commands::MigrateAction;

/// Wire the repositories over an open connection into an [`IdentityManager`].
pub fn build_service(db: &Database, config: &IdentityServiceConfig) -> IdentityManager {
    let conn = db.get_connection();

    IdentityManager::new(
        Arc::new(UserStore::new(Arc::clone(&conn))),
        Arc::new(LookupStore::new(Arc::clone(&conn))),
        Arc::new(ProfileStore::new(conn)),
        config.credentials.clone(),
    )
}

/// Connect, apply pending migrations and build the service.
pub async fn connect(config: &IdentityServiceConfig) -> Result<IdentityManager, DbErr> {
    let db = Database::connect(&config.database).await?;
    Ok(build_service(&db, config))
}
