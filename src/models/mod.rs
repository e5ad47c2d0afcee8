pub mod menu;
pub mod permission;
pub mod role;
pub mod role_menu;
pub mod role_permission;
pub mod user;
pub mod user_role;

pub use menu::MenuType;
pub use permission::PermissionType;
pub use role::SystemRole;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::menu::{self, Entity as Menu};
    pub use super::permission::{self, Entity as Permission};
    pub use super::role::{self, Entity as Role};
    pub use super::role_menu::{self, Entity as RoleMenu};
    pub use super::role_permission::{self, Entity as RolePermission};
    pub use super::user::{self, Entity as User};
    pub use super::user_role::{self, Entity as UserRole};
}
