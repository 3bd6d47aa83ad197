//! Lookup tables (role, status, user type) and the user display projection.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ROLE_NOT_FOUND_LABEL, STATUS_NOT_FOUND_LABEL, USER_TYPE_NOT_FOUND_LABEL};
use crate::user::UserResponse;

/// Which lookup table a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Role,
    Status,
    UserType,
}

impl LookupKind {
    pub const ALL: [LookupKind; 3] = [LookupKind::Role, LookupKind::Status, LookupKind::UserType];

    /// Human-readable table name
    pub fn table_label(&self) -> &'static str {
        match self {
            LookupKind::Role => "Role",
            LookupKind::Status => "Status",
            LookupKind::UserType => "User Type",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_label())
    }
}

/// One lookup row. `value` is the stable key users reference; `id` is the
/// row's own primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub id: i32,
    pub value: i32,
    pub name: String,
}

/// Value → display name, ordered by value.
pub type LookupList = BTreeMap<i32, String>;

/// Collapse lookup rows into a dropdown list.
pub fn to_lookup_list(entries: impl IntoIterator<Item = LookupEntry>) -> LookupList {
    entries.into_iter().map(|e| (e.value, e.name)).collect()
}

/// A user with its related lookup names and profile id resolved.
///
/// Missing relations stay `None`; callers pick their own fallback or use the
/// `*_or_default` helpers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOverview {
    pub user: UserResponse,
    pub role_name: Option<String>,
    pub status_name: Option<String>,
    pub user_type_name: Option<String>,
    /// Primary key of the user type row (not its value)
    pub user_type_pk: Option<i32>,
    pub profile_id: Option<Uuid>,
}

impl UserOverview {
    pub fn role_name_or_default(&self) -> &str {
        self.role_name.as_deref().unwrap_or(ROLE_NOT_FOUND_LABEL)
    }

    pub fn status_name_or_default(&self) -> &str {
        self.status_name.as_deref().unwrap_or(STATUS_NOT_FOUND_LABEL)
    }

    pub fn user_type_name_or_default(&self) -> &str {
        self.user_type_name
            .as_deref()
            .unwrap_or(USER_TYPE_NOT_FOUND_LABEL)
    }
}
