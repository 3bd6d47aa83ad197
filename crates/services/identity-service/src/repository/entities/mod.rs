//! SeaORM entities.

pub mod profile;
pub mod role;
pub mod status;
pub mod user;
pub mod user_type;
