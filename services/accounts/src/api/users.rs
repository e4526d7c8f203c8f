//! Account management handlers.
//!
//! Every route here sits behind the role gate: the password route needs
//! `ROLE_USER`, the rest need `ROLE_ADMIN`. The engine then applies the
//! per-target rules.
use crate::api::error::ApiError;
use crate::api::require_fields;
use crate::api::types::{
    AccountUpdateRequest, MessageResponse, PasswordChangeRequest, RoleUpdateRequest,
};
use crate::app::AppState;
use crate::auth::AccountUpdate;
use crate::auth::gate::require_role;
use crate::model::{AccountSummary, TargetRef};
use account_authz::Role;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;

pub const USER_ROLE_UPDATE_SUCCESS: &str = "User roles have been updated successfully.";
pub const PASSWORD_CHANGE_SUCCESS: &str = "Password changed successfully.";
pub const USER_UPDATE_SUCCESS: &str = "User updated successfully.";
pub const USER_DELETION_SUCCESS: &str = "User deleted successfully.";

#[utoipa::path(
    put,
    path = "/api/user/role",
    tag = "users",
    request_body = RoleUpdateRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Roles replaced", body = MessageResponse),
        (status = 400, description = "Unknown target or role, or own account", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_roles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RoleUpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = require_role(&state, &headers, Role::Admin)?;
    require_fields(&[("username", body.username.as_str())])?;
    state
        .engine
        .update_roles(&actor, &TargetRef::new(body.id, body.username), &body.roles)
        .await?;
    Ok(Json(MessageResponse::new(USER_ROLE_UPDATE_SUCCESS)))
}

#[utoipa::path(
    patch,
    path = "/api/user/password",
    tag = "users",
    request_body = PasswordChangeRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Unknown target", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Neither the account holder nor an admin", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PasswordChangeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = require_role(&state, &headers, Role::User)?;
    require_fields(&[
        ("username", body.username.as_str()),
        ("password", body.password.as_str()),
    ])?;
    state
        .engine
        .change_password(&actor, &TargetRef::new(body.id, body.username), &body.password)
        .await?;
    Ok(Json(MessageResponse::new(PASSWORD_CHANGE_SUCCESS)))
}

#[utoipa::path(
    put,
    path = "/api/user",
    tag = "users",
    request_body = AccountUpdateRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account updated", body = MessageResponse),
        (status = 400, description = "Unknown target or role, taken email, or own roles", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AccountUpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = require_role(&state, &headers, Role::Admin)?;
    require_fields(&[("username", body.username.as_str())])?;
    if let Some(email) = &body.email {
        require_fields(&[("email", email.as_str())])?;
    }
    if let Some(password) = &body.password {
        require_fields(&[("password", password.as_str())])?;
    }
    let update = AccountUpdate {
        email: body.email,
        password: body.password,
        roles: body.roles,
    };
    state
        .engine
        .update_account(&actor, &TargetRef::new(body.id, body.username), update)
        .await?;
    Ok(Json(MessageResponse::new(USER_UPDATE_SUCCESS)))
}

#[utoipa::path(
    delete,
    path = "/api/user/delete/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "Account id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "Unknown account or own account", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_account(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = require_role(&state, &headers, Role::Admin)?;
    state.engine.delete_account(&actor, id).await?;
    Ok(Json(MessageResponse::new(USER_DELETION_SUCCESS)))
}

#[utoipa::path(
    get,
    path = "/api/user/fetch",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All accounts ordered by id", body = [AccountSummary]),
        (status = 401, description = "Missing or invalid token", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    let actor = require_role(&state, &headers, Role::Admin)?;
    Ok(Json(state.engine.list_accounts(&actor).await?))
}
