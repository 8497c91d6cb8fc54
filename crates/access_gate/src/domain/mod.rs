mod access_decision;
mod access_decision_engine;
mod config;
mod role_cache;
mod role_lookup;
mod route_policy;
mod token_resolver;
mod user_role_service;

pub use access_decision::*;
pub use access_decision_engine::*;
pub use config::*;
pub use role_cache::*;
pub use role_lookup::*;
pub use route_policy::*;
pub use token_resolver::*;
pub use user_role_service::*;
