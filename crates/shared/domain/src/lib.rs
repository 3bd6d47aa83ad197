//! Domain layer - Core identity entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the user entity and its credential operations, password hashing, token
//! generation, field validation rules, and the lookup/profile types.

pub mod constants;
pub mod error;
pub mod identity;
pub mod lookup;
pub mod password;
pub mod profile;
pub mod token;
pub mod user;
pub mod validation;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use identity::Identity;
pub use lookup::{to_lookup_list, LookupEntry, LookupKind, LookupList, UserOverview};
pub use password::Password;
pub use profile::Profile;
pub use user::{NewUser, UpdateUser, User, UserResponse};
pub use validation::{FieldError, ValidationErrors};
