//! Repository for the `lists` table.
//!
//! Only the read/create slice the role store needs; list management proper
//! lives elsewhere.

use mailfold_core::types::DbId;
use sqlx::PgPool;

use crate::models::list::{CreateList, List};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides operations over subscriber lists.
pub struct ListRepo;

impl ListRepo {
    /// Insert a new list, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateList) -> Result<List, sqlx::Error> {
        let query = format!("INSERT INTO lists (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, List>(&query)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find a list by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<List>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lists WHERE id = $1");
        sqlx::query_as::<_, List>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all lists ordered by ID ascending.
    pub async fn list(pool: &PgPool) -> Result<Vec<List>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lists ORDER BY id ASC");
        sqlx::query_as::<_, List>(&query).fetch_all(pool).await
    }
}
