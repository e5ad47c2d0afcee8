pub mod authorization;
pub mod menu_tree;
pub mod menus;
pub mod permission_tree;
pub mod permissions;
pub mod roles;
pub mod security;
pub mod users;
pub mod validation;

pub use security::*;

/// Principal performing a write, recorded in audit columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
}

impl Actor {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }

    /// Value stored in `created_by`, `updated_by`, `granted_by` and `assigned_by`
    pub fn audit_id(&self) -> Option<i64> {
        Some(self.user_id)
    }
}
