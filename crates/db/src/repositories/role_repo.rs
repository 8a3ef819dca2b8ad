//! Repository for the `roles` and `role_lists` tables.
//!
//! Roles come in two kinds, discriminated by `role_type`: `user` roles carry
//! a flat array of global permission names, `list` roles carry per-list
//! entries in the `role_lists` association table. A role's list permissions
//! are always written as a full replace of the desired state, never as an
//! incremental merge.

use mailfold_core::error::RoleError;
use mailfold_core::roles::{self, ListPermission};
use mailfold_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::{
    CreateListRole, CreateRole, ListRole, Role, UpdateListRole, UpdateRole,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, role_type, permissions, created_at, updated_at";

/// The foreign key from `users.role_id` to `roles.id`. A delete failing on
/// this constraint means the role is still assigned to users, which callers
/// must treat as a client error rather than a storage fault.
const USERS_ROLE_FK: &str = "fk_users_role_id";

/// Provides CRUD operations for roles and their list permissions.
pub struct RoleRepo;

impl RoleRepo {
    /// List all `user`-type roles ordered by ID ascending.
    pub async fn list_user_roles(pool: &PgPool) -> Result<Vec<Role>, RoleError> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE role_type = $1 ORDER BY id ASC");
        sqlx::query_as::<_, Role>(&query)
            .bind(roles::ROLE_TYPE_USER)
            .fetch_all(pool)
            .await
            .map_err(|e| RoleError::Fetch(e.to_string()))
    }

    /// List all `list`-type roles with their per-list permission entries.
    ///
    /// Each role's entries arrive as one `JSON_AGG` blob. A blob that fails
    /// to decode is logged and that role's entries are left empty; the rest
    /// of the batch is unaffected.
    pub async fn list_list_roles(pool: &PgPool) -> Result<Vec<ListRole>, RoleError> {
        let query = "SELECT r.id, r.name, r.role_type, r.created_at, r.updated_at, \
                (SELECT JSON_AGG(JSON_BUILD_OBJECT(\
                    'list_id', rl.list_id, \
                    'list_name', l.name, \
                    'permissions', rl.permissions) ORDER BY rl.list_id) \
                 FROM role_lists rl LEFT JOIN lists l ON l.id = rl.list_id \
                 WHERE rl.role_id = r.id) AS lists_json \
             FROM roles r WHERE r.role_type = $1 ORDER BY r.id ASC";

        let mut out = sqlx::query_as::<_, ListRole>(query)
            .bind(roles::ROLE_TYPE_LIST)
            .fetch_all(pool)
            .await
            .map_err(|e| RoleError::Fetch(e.to_string()))?;

        for role in &mut out {
            decode_list_permissions(role);
        }

        Ok(out)
    }

    /// Insert a new `user`-type role, returning the created row.
    pub async fn create_user_role(pool: &PgPool, input: &CreateRole) -> Result<Role, RoleError> {
        let query = format!(
            "INSERT INTO roles (name, role_type, permissions) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(&input.name)
            .bind(roles::ROLE_TYPE_USER)
            .bind(&input.permissions)
            .fetch_one(pool)
            .await
            .map_err(|e| RoleError::Create(e.to_string()))
    }

    /// Insert a new `list`-type role, then write its permission entries.
    ///
    /// The base row always carries an empty permission array; the entries
    /// live in `role_lists`. If the follow-up replace fails the role row
    /// remains with no permissions and the caller sees a create error.
    pub async fn create_list_role(
        pool: &PgPool,
        input: &CreateListRole,
    ) -> Result<ListRole, RoleError> {
        let query = format!(
            "INSERT INTO roles (name, role_type, permissions) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        let mut role = sqlx::query_as::<_, ListRole>(&query)
            .bind(&input.name)
            .bind(roles::ROLE_TYPE_LIST)
            .bind(Vec::<String>::new())
            .fetch_one(pool)
            .await
            .map_err(|e| RoleError::Create(e.to_string()))?;

        Self::upsert_list_permissions(pool, role.id, &input.lists)
            .await
            .map_err(|e| RoleError::Create(e.to_string()))?;

        role.lists = persisted_entries(&input.lists);
        Ok(role)
    }

    /// Update a `user`-type role's name and permission set.
    ///
    /// Returns [`RoleError::NotFound`] if no `user` role with the given ID
    /// exists; a role's type can never change after creation.
    pub async fn update_user_role(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRole,
    ) -> Result<Role, RoleError> {
        let query = format!(
            "UPDATE roles SET name = $2, permissions = $3, updated_at = NOW() \
             WHERE id = $1 AND role_type = $4 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.permissions)
            .bind(roles::ROLE_TYPE_USER)
            .fetch_optional(pool)
            .await
            .map_err(|e| RoleError::Update(e.to_string()))?
            .ok_or(RoleError::NotFound { id })
    }

    /// Update a `list`-type role's name, then fully replace its permission
    /// entries.
    ///
    /// Returns [`RoleError::NotFound`] if no `list` role with the given ID
    /// exists.
    pub async fn update_list_role(
        pool: &PgPool,
        id: DbId,
        input: &UpdateListRole,
    ) -> Result<ListRole, RoleError> {
        let query = format!(
            "UPDATE roles SET name = $2, updated_at = NOW() \
             WHERE id = $1 AND role_type = $3 RETURNING {COLUMNS}"
        );
        let mut role = sqlx::query_as::<_, ListRole>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(roles::ROLE_TYPE_LIST)
            .fetch_optional(pool)
            .await
            .map_err(|e| RoleError::Update(e.to_string()))?
            .ok_or(RoleError::NotFound { id })?;

        Self::upsert_list_permissions(pool, role.id, &input.lists).await?;

        role.lists = persisted_entries(&input.lists);
        Ok(role)
    }

    /// Replace a role's list permissions with the given desired state.
    ///
    /// Entries omitted from `entries` are removed from persisted state;
    /// entries with an empty permission subset are pruned by the encoder
    /// before the write. The replace is one statement — a CTE deletes stale
    /// rows while the insert upserts the desired ones — so a concurrent
    /// reader never observes a half-replaced set. Passing an empty desired
    /// state clears all of the role's entries.
    pub async fn upsert_list_permissions(
        pool: &PgPool,
        role_id: DbId,
        entries: &[ListPermission],
    ) -> Result<(), RoleError> {
        let encoded = roles::encode_list_permissions(entries);

        // sqlx binds one-dimensional arrays only, so the permission rows
        // travel as a flat TEXT[] sliced at a fixed stride per row.
        // ARRAY_REMOVE() strips the "" padding the encoder added.
        let query = format!(
            "WITH stale AS (\
                DELETE FROM role_lists \
                WHERE role_id = $1 AND list_id <> ALL($2::BIGINT[])\
             ) \
             INSERT INTO role_lists (role_id, list_id, permissions) \
             SELECT $1, t.list_id, \
                    ARRAY_REMOVE(($3::TEXT[])[(t.ord::INT - 1) * {w} + 1 : t.ord::INT * {w}], '') \
             FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(list_id, ord) \
             ON CONFLICT (role_id, list_id) \
                DO UPDATE SET permissions = EXCLUDED.permissions, updated_at = NOW()",
            w = roles::LIST_PERM_COUNT
        );

        sqlx::query(&query)
            .bind(role_id)
            .bind(&encoded.list_ids)
            .bind(&encoded.permissions)
            .execute(pool)
            .await
            .map_err(|e| RoleError::Upsert(e.to_string()))?;

        Ok(())
    }

    /// Remove a single list-permission entry from a role.
    pub async fn delete_list_permission(
        pool: &PgPool,
        role_id: DbId,
        list_id: DbId,
    ) -> Result<(), RoleError> {
        sqlx::query("DELETE FROM role_lists WHERE role_id = $1 AND list_id = $2")
            .bind(role_id)
            .bind(list_id)
            .execute(pool)
            .await
            .map_err(classify_delete_error)?;
        Ok(())
    }

    /// Delete a role of either kind.
    ///
    /// Succeeds (as a no-op) for IDs that do not exist. Deleting a role that
    /// users are still assigned to fails on the users foreign key and
    /// surfaces as [`RoleError::InUse`], leaving the role intact.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), RoleError> {
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(classify_delete_error)?;
        Ok(())
    }
}

/// Decode the `JSON_AGG` blob on a fetched list role into structured
/// entries.
///
/// A malformed blob is the single recovered-locally failure in this store:
/// it is logged and the role's entries are left empty so the surrounding
/// batch still succeeds.
fn decode_list_permissions(role: &mut ListRole) {
    let Some(raw) = role.lists_json.take() else {
        return;
    };

    match serde_json::from_value(raw) {
        Ok(lists) => role.lists = lists,
        Err(err) => {
            tracing::warn!(
                role_id = role.id,
                error = %err,
                "failed to decode list permissions, leaving them empty"
            );
        }
    }
}

/// The subset of a desired permission state that survives the write, for
/// echoing back on create/update without a re-fetch. Mirrors the encoder:
/// empty subsets are dropped and the rest are capped at the fixed row width.
fn persisted_entries(entries: &[ListPermission]) -> Vec<ListPermission> {
    entries
        .iter()
        .filter(|e| !e.permissions.is_empty())
        .map(|e| {
            let mut entry = e.clone();
            entry.permissions.truncate(roles::LIST_PERM_COUNT);
            entry
        })
        .collect()
}

/// Map a failed delete to the domain taxonomy.
///
/// A foreign-key violation (SQLSTATE 23503) on [`USERS_ROLE_FK`] means the
/// role is still assigned to users; everything else is a storage fault.
fn classify_delete_error(err: sqlx::Error) -> RoleError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") && db_err.constraint() == Some(USERS_ROLE_FK)
        {
            return RoleError::InUse;
        }
    }
    RoleError::Delete(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;
    use chrono::Utc;
    use serde_json::json;

    /// Writer handing tracing output to a shared buffer so tests can assert
    /// on emitted log lines.
    #[derive(Clone)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn list_role(lists_json: Option<serde_json::Value>) -> ListRole {
        ListRole {
            id: 1,
            name: "Editors".to_string(),
            role_type: roles::ROLE_TYPE_LIST.to_string(),
            lists_json,
            lists: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn decode_populates_entries_and_drains_blob() {
        let mut role = list_role(Some(json!([
            {"list_id": 3, "list_name": "Weekly", "permissions": ["list:get", "list:manage"]}
        ])));
        decode_list_permissions(&mut role);

        assert!(role.lists_json.is_none());
        assert_eq!(role.lists.len(), 1);
        assert_eq!(role.lists[0].list_id, 3);
        assert_eq!(role.lists[0].list_name.as_deref(), Some("Weekly"));
    }

    #[test]
    fn decode_recovers_from_malformed_blob_and_warns() {
        let capture = LogCapture::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer({
                let capture = capture.clone();
                move || capture.clone()
            })
            .finish();

        let mut role = list_role(Some(json!([{"list_id": "not-a-number"}])));
        tracing::subscriber::with_default(subscriber, || decode_list_permissions(&mut role));

        assert!(role.lists.is_empty());

        let logs = capture.contents();
        assert!(logs.contains("WARN"), "expected a warning, got: {logs}");
        assert!(logs.contains("failed to decode list permissions"));
        assert!(logs.contains("role_id=1"));
    }

    #[test]
    fn decode_skips_roles_without_entries() {
        let mut role = list_role(None);
        decode_list_permissions(&mut role);

        assert!(role.lists.is_empty());
    }

    #[test]
    fn persisted_entries_prunes_empty_subsets() {
        let entries = vec![
            ListPermission {
                list_id: 3,
                list_name: None,
                permissions: vec![roles::LIST_PERM_GET.to_string()],
            },
            ListPermission {
                list_id: 7,
                list_name: None,
                permissions: Vec::new(),
            },
        ];

        let kept = persisted_entries(&entries);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].list_id, 3);
    }

    #[test]
    fn persisted_entries_truncates_oversized_subsets() {
        let entries = vec![ListPermission {
            list_id: 3,
            list_name: None,
            permissions: vec![
                roles::LIST_PERM_GET.to_string(),
                roles::LIST_PERM_MANAGE.to_string(),
                "extra".to_string(),
            ],
        }];

        // The echoed entity must agree with what the encoder persists.
        let kept = persisted_entries(&entries);
        assert_eq!(kept[0].permissions.len(), roles::LIST_PERM_COUNT);
        assert_eq!(kept[0].permissions, vec![roles::LIST_PERM_GET, roles::LIST_PERM_MANAGE]);
    }
}
