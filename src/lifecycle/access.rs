use uuid::Uuid;

use crate::models::Caller;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Owners can act on their own documents; admins can act on any.
pub fn check(caller: &Caller, owner_id: Uuid) -> Access {
    if caller.id == owner_id || caller.is_admin() {
        Access::Allow
    } else {
        Access::Deny
    }
}
