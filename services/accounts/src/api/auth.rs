//! Signin and signup handlers.
//!
//! Both routes are open. Signup never returns a token; clients sign in
//! afterwards.
use crate::api::error::ApiError;
use crate::api::require_fields;
use crate::api::types::{JwtResponse, MessageResponse, SigninRequest, SignupRequest};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

pub const USER_CREATION_SUCCESS: &str = "User registered successfully.";

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "auth",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Session issued", body = JwtResponse),
        (status = 400, description = "Account suspended or blank fields", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Bad credentials", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn signin(
    State(state): State<AppState>,
    Json(body): Json<SigninRequest>,
) -> Result<Json<JwtResponse>, ApiError> {
    require_fields(&[
        ("username", body.username.as_str()),
        ("password", body.password.as_str()),
    ])?;
    let outcome = state.engine.login(&body.username, &body.password).await?;
    Ok(Json(JwtResponse {
        token: outcome.token,
        token_type: outcome.token_type.to_string(),
        expires_at: outcome.expires_at,
        id: outcome.id,
        username: outcome.username,
        email: outcome.email,
        roles: outcome.roles,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = MessageResponse),
        (status = 400, description = "Duplicate username or email", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_fields(&[
        ("username", body.username.as_str()),
        ("email", body.email.as_str()),
        ("password", body.password.as_str()),
    ])?;
    state
        .engine
        .register(&body.username, &body.email, &body.password)
        .await?;
    Ok(Json(MessageResponse::new(USER_CREATION_SUCCESS)))
}
