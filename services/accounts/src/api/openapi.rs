//! OpenAPI schema aggregation for the accounts API.
use crate::api::types::{
    AccountUpdateRequest, ErrorResponse, HealthStatus, JwtResponse, MessageResponse,
    PasswordChangeRequest, RoleUpdateRequest, SigninRequest, SignupRequest,
};
use crate::api::{auth, system, users};
use crate::model::AccountSummary;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "accounts",
        version = "v1",
        description = "Account registration, sessions and account management"
    ),
    paths(
        system::system_health,
        auth::signin,
        auth::signup,
        users::update_roles,
        users::change_password,
        users::update_account,
        users::delete_account,
        users::list_accounts
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        MessageResponse,
        SigninRequest,
        SignupRequest,
        JwtResponse,
        RoleUpdateRequest,
        PasswordChangeRequest,
        AccountUpdateRequest,
        AccountSummary
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "auth", description = "Signin and signup"),
        (name = "users", description = "Account management")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
