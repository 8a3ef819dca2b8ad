//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod list_repo;
pub mod role_repo;
pub mod user_repo;

pub use list_repo::ListRepo;
pub use role_repo::RoleRepo;
pub use user_repo::UserRepo;
