//! Subscriber list entity model.

use mailfold_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A list row from the `lists` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct List {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for creating a list.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateList {
    pub name: String,
}
