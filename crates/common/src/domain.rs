mod in_memory_user_role_repository;
mod result;
mod role;
mod user_role;

pub use in_memory_user_role_repository::*;
pub use result::*;
pub use role::*;
pub use user_role::*;
