//! Role entity models and DTOs.

use mailfold_core::roles::ListPermission;
use mailfold_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A role row from the `roles` table.
///
/// `permissions` holds global permission names and is only meaningful for
/// `user`-type roles; it is kept empty for `list`-type roles.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub role_type: String,
    pub permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A `list`-type role together with its per-list permission entries.
///
/// `lists_json` is the raw `JSON_AGG` blob produced by the batch fetch
/// query; the repository decodes it into `lists` and drains it before
/// returning. Write paths never populate it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ListRole {
    pub id: DbId,
    pub name: String,
    pub role_type: String,
    #[serde(skip)]
    #[sqlx(default)]
    pub(crate) lists_json: Option<serde_json::Value>,
    #[sqlx(skip)]
    pub lists: Vec<ListPermission>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for creating a `user`-type role.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub permissions: Vec<String>,
}

/// Payload for creating a `list`-type role with its permission entries.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListRole {
    pub name: String,
    pub lists: Vec<ListPermission>,
}

/// Full-update payload for a `user`-type role.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRole {
    pub name: String,
    pub permissions: Vec<String>,
}

/// Full-update payload for a `list`-type role. `lists` is the complete
/// desired permission state, not a delta.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateListRole {
    pub name: String,
    pub lists: Vec<ListPermission>,
}
