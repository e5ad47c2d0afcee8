pub mod common;
pub mod menu;
pub mod permission;
pub mod role;
pub mod user;

pub use common::*;
pub use menu::*;
pub use permission::*;
pub use role::*;
pub use user::*;
