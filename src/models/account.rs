use serde::{Deserialize, Serialize};

/// Account ranks, ordered. The derived `Ord` is the rank comparison used by
/// every seniority check, not just a label.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Hoofdadmin,
    Subsuperadmin,
    Superadmin,
}

impl Role {
    /// Manager-capable ranks are the ones whose subtrees get expanded during
    /// subordinate enumeration. Plain users have no subordinates by
    /// construction and superadmins see everything without a walk.
    pub fn is_manager(self) -> bool {
        matches!(self, Role::Admin | Role::Hoofdadmin | Role::Subsuperadmin)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Account {
    #[serde(rename = "uid")]
    pub id: String, // assigned by the identity provider, immutable
    pub email: String, // ! unique, enforced by the identity provider
    pub display_name: String,
    pub role: Role,
    pub parent_id: Option<String>, // inviting/managing account; None for roots
    pub created_at: String,        // ! TIMESTAMP (RFC3339)
    pub last_login: Option<String>,
}

/// Partial-merge update for an account record. Absent fields are left
/// untouched by the store.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

/// Account annotated with its parent's display name for administration
/// views. "None" for roots, "Unknown" when the parent id dangles.
#[derive(Serialize, Debug, Clone)]
pub struct ManagedAccount {
    #[serde(flatten)]
    pub account: Account,
    pub parent_display_name: String,
}

/// The merged current-actor view: identity-provider fields joined with the
/// stored profile. Every authorization decision downstream reads this and
/// nothing else.
#[derive(Serialize, Debug, Clone)]
pub struct Actor {
    #[serde(rename = "uid")]
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub parent_id: Option<String>,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl Actor {
    pub fn from_parts(email: String, account: Account) -> Self {
        Self {
            id: account.id,
            email,
            display_name: account.display_name,
            role: account.role,
            parent_id: account.parent_id,
            created_at: account.created_at,
            last_login: account.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order_is_total() {
        assert!(Role::User < Role::Admin);
        assert!(Role::Admin < Role::Hoofdadmin);
        assert!(Role::Hoofdadmin < Role::Subsuperadmin);
        assert!(Role::Subsuperadmin < Role::Superadmin);
    }

    #[test]
    fn roles_persist_as_lowercase_strings() {
        let encoded = serde_json::to_string(&Role::Hoofdadmin).unwrap();
        assert_eq!(encoded, "\"hoofdadmin\"");
        let decoded: Role = serde_json::from_str("\"subsuperadmin\"").unwrap();
        assert_eq!(decoded, Role::Subsuperadmin);
    }

    #[test]
    fn manager_capability_matches_expansion_rule() {
        assert!(!Role::User.is_manager());
        assert!(Role::Admin.is_manager());
        assert!(Role::Hoofdadmin.is_manager());
        assert!(Role::Subsuperadmin.is_manager());
        assert!(!Role::Superadmin.is_manager());
    }
}
