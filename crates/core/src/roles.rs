//! Well-known role constants and list-permission encoding.
//!
//! Role rows carry a `role_type` discriminator; the known values and the
//! per-list permission names live here so the repository layer and its
//! callers agree on spelling. The constants must match the CHECK constraint
//! in `20260301000002_create_roles_table.sql`.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A role granting global feature permissions.
pub const ROLE_TYPE_USER: &str = "user";

/// A role granting per-list permissions.
pub const ROLE_TYPE_LIST: &str = "list";

/// Permission to view a list and its subscribers.
pub const LIST_PERM_GET: &str = "list:get";

/// Permission to manage a list: edit, import, delete.
pub const LIST_PERM_MANAGE: &str = "list:manage";

/// Number of distinct per-list permissions. Every encoded permission row is
/// padded to exactly this width.
pub const LIST_PERM_COUNT: usize = 2;

/// One list's permission entry within a list role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPermission {
    pub list_id: DbId,
    /// Display name of the list. Populated on fetch, ignored on write.
    #[serde(default)]
    pub list_name: Option<String>,
    pub permissions: Vec<String>,
}

/// A desired list-permission set restructured for the bulk replace
/// statement.
///
/// `permissions` is flattened row-major at a fixed stride of
/// [`LIST_PERM_COUNT`]: row `i`'s subset occupies
/// `permissions[i * LIST_PERM_COUNT .. (i + 1) * LIST_PERM_COUNT]`, padded
/// with `""`. The SQL side reconstructs each row by slicing at that stride,
/// so uniform width across the batch is a hard requirement of the bulk-write
/// contract, not a convenience.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedListPermissions {
    pub list_ids: Vec<DbId>,
    pub permissions: Vec<String>,
}

/// Canonicalize a desired list-permission set for the bulk replace.
///
/// Entries with an empty permission subset mean "no access" and are dropped
/// entirely; the remaining subsets are truncated or padded to
/// [`LIST_PERM_COUNT`] slots.
pub fn encode_list_permissions(entries: &[ListPermission]) -> EncodedListPermissions {
    let mut out = EncodedListPermissions {
        list_ids: Vec::with_capacity(entries.len()),
        permissions: Vec::with_capacity(entries.len() * LIST_PERM_COUNT),
    };

    for entry in entries {
        if entry.permissions.is_empty() {
            continue;
        }

        out.list_ids.push(entry.list_id);
        for slot in 0..LIST_PERM_COUNT {
            out.permissions
                .push(entry.permissions.get(slot).cloned().unwrap_or_default());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(list_id: DbId, perms: &[&str]) -> ListPermission {
        ListPermission {
            list_id,
            list_name: None,
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn empty_input_encodes_empty() {
        let encoded = encode_list_permissions(&[]);
        assert!(encoded.list_ids.is_empty());
        assert!(encoded.permissions.is_empty());
    }

    #[test]
    fn empty_subset_is_pruned() {
        let encoded = encode_list_permissions(&[
            entry(3, &[LIST_PERM_GET, LIST_PERM_MANAGE]),
            entry(7, &[]),
        ]);
        assert_eq!(encoded.list_ids, vec![3]);
        assert_eq!(encoded.permissions, vec![LIST_PERM_GET, LIST_PERM_MANAGE]);
    }

    #[test]
    fn single_permission_is_padded_to_width() {
        let encoded = encode_list_permissions(&[entry(5, &[LIST_PERM_MANAGE])]);
        assert_eq!(encoded.list_ids, vec![5]);
        assert_eq!(encoded.permissions, vec![LIST_PERM_MANAGE.to_string(), String::new()]);
    }

    #[test]
    fn rows_stay_stride_aligned() {
        let encoded = encode_list_permissions(&[
            entry(1, &[LIST_PERM_GET]),
            entry(2, &[]),
            entry(3, &[LIST_PERM_MANAGE, LIST_PERM_GET]),
        ]);
        assert_eq!(encoded.list_ids, vec![1, 3]);
        assert_eq!(encoded.permissions.len(), encoded.list_ids.len() * LIST_PERM_COUNT);
        // Row 0 occupies slots 0..2, row 1 slots 2..4.
        assert_eq!(&encoded.permissions[0..2], &[LIST_PERM_GET.to_string(), String::new()]);
        assert_eq!(
            &encoded.permissions[2..4],
            &[LIST_PERM_MANAGE.to_string(), LIST_PERM_GET.to_string()]
        );
    }

    #[test]
    fn oversized_subset_is_truncated() {
        let encoded = encode_list_permissions(&[entry(9, &[LIST_PERM_GET, LIST_PERM_MANAGE, "extra"])]);
        assert_eq!(encoded.permissions.len(), LIST_PERM_COUNT);
    }

    #[test]
    fn list_permission_decodes_without_name() {
        let lp: ListPermission =
            serde_json::from_value(serde_json::json!({"list_id": 4, "permissions": ["list:get"]}))
                .unwrap();
        assert_eq!(lp.list_id, 4);
        assert_eq!(lp.list_name, None);
        assert_eq!(lp.permissions, vec![LIST_PERM_GET]);
    }
}
