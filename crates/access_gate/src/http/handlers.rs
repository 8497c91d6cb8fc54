use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use common::auth::AuthenticatedCaller;
use common::domain::{Role, UserRoleAssignment};
use common::http::IdentityCookie;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::http::{domain_error_to_response, sanitize_return_path, AppState};

#[derive(Debug, Serialize)]
pub struct UserRoleResponse {
    pub user_id: String,
    pub role: Role,
}

impl From<UserRoleAssignment> for UserRoleResponse {
    fn from(assignment: UserRoleAssignment) -> Self {
        Self {
            user_id: assignment.user_id,
            role: assignment.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: String,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn home() -> &'static str {
    "masjid community"
}

/// Login surface placeholder; the identity provider owns the actual flow
pub async fn login(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    let return_to = params
        .get(&state.config.return_path_param)
        .and_then(|path| sanitize_return_path(path))
        .unwrap_or("/");
    format!("login required; return to {}", return_to)
}

/// Clear both identity cookies and send the caller home
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, HeaderValue::from_static("/"));
    for name in [&state.config.token_cookie_name, &state.config.user_id_cookie_name] {
        IdentityCookie::clear(name.as_str(), state.config.secure_cookies).append_to_headers(&mut headers);
    }
    (StatusCode::SEE_OTHER, headers).into_response()
}

/// Placeholder for the protected section pages.
///
/// Serves any path under a policy prefix; everything else is a 404.
pub async fn section_page(
    State(state): State<AppState>,
    caller: Option<Extension<AuthenticatedCaller>>,
    uri: Uri,
) -> Response {
    let Some(entry) = state.policy.match_path(uri.path()) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response();
    };

    let caller = caller.map(|Extension(caller)| caller);
    Json(json!({
        "section": entry.path_prefix,
        "path": uri.path(),
        "user_id": caller.as_ref().map(|c| c.user_id.clone()),
        "role": caller.as_ref().map(|c| c.role),
    }))
    .into_response()
}

#[instrument(skip(state))]
pub async fn get_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.user_role_service.get_role(&user_id).await {
        Ok(assignment) => Json(UserRoleResponse::from(assignment)).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

#[instrument(skip(state, request))]
pub async fn put_user_role(
    State(state): State<AppState>,
    caller: Option<Extension<AuthenticatedCaller>>,
    Path(user_id): Path<String>,
    Json(request): Json<AssignRoleRequest>,
) -> Response {
    let role = match Role::from_str(&request.role) {
        Ok(role) => role,
        Err(e) => return domain_error_to_response(e),
    };

    if let Some(Extension(caller)) = &caller {
        debug!(admin_id = %caller.user_id, user_id = %user_id, role = %role, "role change requested");
    }

    match state.user_role_service.assign_role(&user_id, role).await {
        Ok(assignment) => Json(UserRoleResponse::from(assignment)).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}
