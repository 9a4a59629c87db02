//! Role-hierarchy authorization over the account forest.
//!
//! Accounts form a forest via `parent_id`. Everything here answers the
//! question "may this actor administer that account" without trusting any
//! client-supplied claim: the walk happens against the store, checks fail
//! closed, and traversals carry explicit bounds so malformed data cannot
//! hang a request.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

use crate::consts::hierarchy_const::MAX_PARENT_HOPS;
use crate::models::account::{Account, Actor, ManagedAccount, Role};
use crate::store::AccountStore;

/// The set of roles a given rank may grant, always strictly below its own
/// rank. Superadmin cannot grant superadmin.
pub fn assignable_roles(role: Role) -> &'static [Role] {
    match role {
        Role::Superadmin => &[
            Role::Subsuperadmin,
            Role::Hoofdadmin,
            Role::Admin,
            Role::User,
        ],
        Role::Subsuperadmin => &[Role::Hoofdadmin, Role::Admin, Role::User],
        Role::Hoofdadmin => &[Role::Admin, Role::User],
        Role::Admin => &[Role::User],
        Role::User => &[],
    }
}

/// Walks upward from `target_id` via `parent_id`, true as soon as the
/// manager is reached. Self is never its own subordinate. Bounded at
/// [`MAX_PARENT_HOPS`] hops so a cyclic or corrupted chain terminates; any
/// miss or store failure resolves to false.
pub async fn is_subordinate(accounts: &dyn AccountStore, manager_id: &str, target_id: &str) -> bool {
    if manager_id == target_id {
        return false;
    }

    let mut current = target_id.to_string();
    for _ in 0..MAX_PARENT_HOPS {
        let parent_id = match accounts.get(&current).await {
            Ok(Some(account)) => account.parent_id,
            Ok(None) => return false,
            Err(err) => {
                warn!("subordinate walk aborted at {current}: {err}");
                return false;
            }
        };
        match parent_id {
            Some(parent_id) if parent_id == manager_id => return true,
            Some(parent_id) => current = parent_id,
            None => return false,
        }
    }
    false
}

/// Authoritative manage check: never self, superadmin manages everyone,
/// everyone else needs both the higher rank and the ownership chain.
pub async fn can_manage(accounts: &dyn AccountStore, actor: &Actor, target: &Account) -> bool {
    if actor.id == target.id {
        return false;
    }
    if actor.role == Role::Superadmin {
        return true;
    }
    actor.role > target.role && is_subordinate(accounts, &actor.id, &target.id).await
}

/// Every account the actor may administer, annotated with the parent's
/// display name for the admin views. Superadmin sees the whole store; a
/// manager rank sees its transitive descendants; a plain user sees nothing.
/// Store failures resolve to the empty list.
pub async fn list_managed_accounts(accounts: &dyn AccountStore, actor: &Actor) -> Vec<ManagedAccount> {
    let managed = match actor.role {
        Role::Superadmin => accounts.list_all().await,
        Role::Subsuperadmin | Role::Hoofdadmin | Role::Admin => {
            collect_descendants(accounts, &actor.id).await
        }
        Role::User => return Vec::new(),
    };

    let managed = match managed {
        Ok(managed) => managed,
        Err(err) => {
            warn!("managed-account listing failed for {}: {err}", actor.id);
            return Vec::new();
        }
    };

    // One lookup table for all parent names instead of a query per row.
    let names: HashMap<String, String> = match accounts.list_all().await {
        Ok(all) => all
            .into_iter()
            .map(|a| (a.id, a.display_name))
            .collect(),
        Err(err) => {
            warn!("parent-name lookup failed for {}: {err}", actor.id);
            return Vec::new();
        }
    };

    managed
        .into_iter()
        .map(|account| {
            let parent_display_name = match &account.parent_id {
                Some(parent_id) => names
                    .get(parent_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                None => "None".to_string(),
            };
            ManagedAccount {
                account,
                parent_display_name,
            }
        })
        .collect()
}

/// Iterative frontier expansion with an explicit visited set. Children are
/// fetched level by level; only manager-capable children are expanded
/// further, so the frontier depth is bounded by the manager rank count.
async fn collect_descendants(
    accounts: &dyn AccountStore,
    root_id: &str,
) -> Result<Vec<Account>, crate::store::StoreError> {
    let mut descendants = Vec::new();
    let mut visited: HashSet<String> = HashSet::from([root_id.to_string()]);
    let mut frontier: VecDeque<String> = VecDeque::from([root_id.to_string()]);

    while let Some(id) = frontier.pop_front() {
        for child in accounts.children_of(&id).await? {
            if !visited.insert(child.id.clone()) {
                continue;
            }
            if child.role.is_manager() {
                frontier.push_back(child.id.clone());
            }
            descendants.push(child);
        }
    }

    Ok(descendants)
}
