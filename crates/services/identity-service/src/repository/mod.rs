//! Repository layer for data access.

pub mod entities;
mod lookup_repository;
mod profile_repository;
mod user_repository;

pub use lookup_repository::{LookupRepository, LookupStore};
pub use profile_repository::{ProfileRepository, ProfileStore};
pub use user_repository::{StatusFilter, UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use lookup_repository::MockLookupRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use profile_repository::MockProfileRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
