use serde::{Deserialize, Serialize};

use crate::models::account::Role;

/// A pending, single-use registration grant binding an email to a role and
/// a managing account. Created by an authorized inviter, consumed exactly
/// once at registration, never mutated otherwise.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Invitation {
    pub email: String, // ! unique among pending invitations
    pub display_name: String,
    pub role: Role,        // the role granted at registration
    pub parent_id: String, // the inviter's account id
    pub created_at: String,
}
