//! Identity capability required by session and authentication middleware.

use uuid::Uuid;

use crate::token::constant_time_eq;

/// Minimal identity contract: an id, a remember-me key, and key validation.
///
/// Authentication collaborators depend on this trait rather than on a
/// concrete user record.
pub trait Identity {
    /// Primary key of the identity
    fn id(&self) -> Uuid;

    /// Stored remember-me key, if one has been issued
    fn auth_key(&self) -> Option<&str>;

    /// Check a candidate key against the stored one.
    ///
    /// A missing stored key never validates.
    fn validate_auth_key(&self, candidate: &str) -> bool {
        match self.auth_key() {
            Some(stored) => constant_time_eq(stored, candidate),
            None => false,
        }
    }
}
