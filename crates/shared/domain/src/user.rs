//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_ROLE_VALUE, DEFAULT_USER_TYPE_VALUE, STATUS_ACTIVE};
use crate::error::DomainResult;
use crate::identity::Identity;
use crate::password::Password;
use crate::token;

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub auth_key: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    pub status_id: i32,
    pub role_id: i32,
    pub user_type_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with default status, role and type.
    ///
    /// The password hash starts empty and never verifies until
    /// [`User::set_password`] is called.
    pub fn new(id: Uuid, username: String, email: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username,
            email,
            password_hash: String::new(),
            auth_key: None,
            password_reset_token: None,
            status_id: STATUS_ACTIVE,
            role_id: DEFAULT_ROLE_VALUE,
            user_type_id: DEFAULT_USER_TYPE_VALUE,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check a plain text password against the stored hash.
    pub fn validate_password(&self, plain_text: &str) -> bool {
        Password::from_hash(self.password_hash.as_str()).verify(plain_text)
    }

    /// Hash and store a new password of at least `min_length` characters.
    /// Each call uses a fresh salt.
    pub fn set_password(&mut self, plain_text: &str, min_length: usize) -> DomainResult<()> {
        self.password_hash = Password::with_min_length(plain_text, min_length)?.into_string();
        Ok(())
    }

    /// Issue a new remember-me key.
    pub fn generate_auth_key(&mut self) {
        self.auth_key = Some(token::generate_auth_key());
    }

    /// Issue a new password reset token stamped with the current time.
    pub fn generate_password_reset_token(&mut self) {
        self.generate_password_reset_token_at(Utc::now().timestamp());
    }

    /// Issue a new password reset token stamped with `issued_at` (unix seconds).
    pub fn generate_password_reset_token_at(&mut self, issued_at: i64) {
        self.password_reset_token = Some(token::generate_password_reset_token(issued_at));
    }

    /// Drop the pending reset token so it cannot be used again.
    pub fn remove_password_reset_token(&mut self) {
        self.password_reset_token = None;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Identity for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn auth_key(&self) -> Option<&str> {
        self.auth_key.as_deref()
    }
}

/// Registration input
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Defaults to [`STATUS_ACTIVE`]
    pub status_id: Option<i32>,
    /// Defaults to [`DEFAULT_ROLE_VALUE`]
    pub role_id: Option<i32>,
    /// Defaults to [`DEFAULT_USER_TYPE_VALUE`]
    pub user_type_id: Option<i32>,
}

/// User update data transfer object
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub status_id: Option<i32>,
    pub role_id: Option<i32>,
    pub user_type_id: Option<i32>,
}

impl UpdateUser {
    /// Apply the present fields to `user`.
    pub fn apply_to(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(status_id) = self.status_id {
            user.status_id = status_id;
        }
        if let Some(role_id) = self.role_id {
            user.role_id = role_id;
        }
        if let Some(user_type_id) = self.user_type_id {
            user.user_type_id = user_type_id;
        }
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub status_id: i32,
    pub role_id: i32,
    pub user_type_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            status_id: user.status_id,
            role_id: user.role_id,
            user_type_id: user.user_type_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}
