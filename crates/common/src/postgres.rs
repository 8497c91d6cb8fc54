mod client;
mod config;
mod migrations;
mod user_role_repository;

pub use client::*;
pub use config::*;
pub use migrations::*;
pub use user_role_repository::*;
