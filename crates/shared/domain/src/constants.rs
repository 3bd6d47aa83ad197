//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Lookup defaults
// =============================================================================

/// Status value of an active account. Only active users resolve as identities.
pub const STATUS_ACTIVE: i32 = 10;

/// Role value assigned to new users
pub const DEFAULT_ROLE_VALUE: i32 = 10;

/// User type value assigned to new users
pub const DEFAULT_USER_TYPE_VALUE: i32 = 10;

// =============================================================================
// Validation
// =============================================================================

/// Minimum username length (characters, after trimming)
pub const MIN_USERNAME_LENGTH: usize = 2;

/// Maximum username length (characters, after trimming)
pub const MAX_USERNAME_LENGTH: usize = 255;

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 6;

// =============================================================================
// Tokens
// =============================================================================

/// Length of the remember-me authentication key
pub const AUTH_KEY_LENGTH: usize = 32;

/// Length of the random part of a password reset token
pub const RESET_TOKEN_RANDOM_LENGTH: usize = 32;

/// Separator between the random part and the issue timestamp of a reset token
pub const RESET_TOKEN_SEPARATOR: char = '_';

/// Default lifetime of a password reset token in seconds
pub const DEFAULT_PASSWORD_RESET_TOKEN_EXPIRE_SECONDS: i64 = 3600;

// =============================================================================
// Display placeholders
// =============================================================================

/// Shown when a user's role value has no matching lookup row
pub const ROLE_NOT_FOUND_LABEL: &str = "- role not found -";

/// Shown when a user's status value has no matching lookup row
pub const STATUS_NOT_FOUND_LABEL: &str = "- no status -";

/// Shown when a user's type value has no matching lookup row
pub const USER_TYPE_NOT_FOUND_LABEL: &str = "- type not set -";
