//! Command handlers invoked by the binary.

mod lookups;
mod migrate;
mod user;

pub use lookups::print_lookups;
pub use migrate::{run_migrations, MigrateAction};
pub use user::{create_user, request_reset, reset_password, show_user, CreateUserArgs};

/// Boxed error used by command handlers.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;
