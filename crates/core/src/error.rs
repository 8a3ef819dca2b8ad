use crate::types::DbId;

/// Errors produced by the role store.
///
/// Storage-originated failures carry the operation kind and the driver
/// message; none of them are retried here. `NotFound` is inferred by the
/// store (an update that matches no row), never raised by the driver.
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("error fetching roles: {0}")]
    Fetch(String),

    #[error("error creating role: {0}")]
    Create(String),

    #[error("error updating role: {0}")]
    Update(String),

    #[error("error deleting role: {0}")]
    Delete(String),

    #[error("error saving list permissions: {0}")]
    Upsert(String),

    #[error("role not found: {id}")]
    NotFound { id: DbId },

    #[error("cannot delete a role that is still assigned to users")]
    InUse,
}
