use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use common::http::{HttpLoggingConfig, HttpLoggingLayer};

use crate::domain::{AccessGateConfig, RoutePolicyTable, UserRoleService};
use crate::http::handlers::{
    get_user_role, health, home, login, logout, put_user_role, section_page,
};
use crate::AccessGateServices;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AccessGateConfig>,
    pub policy: Arc<RoutePolicyTable>,
    pub user_role_service: Arc<UserRoleService>,
}

impl AppState {
    pub fn from_services(services: &AccessGateServices) -> Self {
        Self {
            config: Arc::clone(&services.config),
            policy: Arc::clone(&services.policy),
            user_role_service: Arc::clone(&services.user_role_service),
        }
    }
}

/// Build the application router with the access gate in front of every
/// route, including the section fallback
pub fn build_router(services: &AccessGateServices, logging: HttpLoggingConfig) -> Router {
    let state = AppState::from_services(services);
    let login_path = state.config.login_path.clone();

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route(&login_path, get(login))
        .route("/logout", post(logout))
        .route(
            "/admin/api/users/:user_id/role",
            get(get_user_role).put(put_user_role),
        )
        .fallback(section_page)
        .with_state(state)
        .layer(services.gate_layer())
        .layer(HttpLoggingLayer::new(logging))
}
