//! Accounts HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::auth::AccountEngine;
use crate::observability;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub engine: AccountEngine,
}

impl AppState {
    pub fn new(engine: AccountEngine) -> Self {
        Self { engine }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route("/api/auth/signin", axum::routing::post(api::auth::signin))
        .route("/api/auth/signup", axum::routing::post(api::auth::signup))
        .route("/api/user", axum::routing::put(api::users::update_account))
        .route(
            "/api/user/role",
            axum::routing::put(api::users::update_roles),
        )
        .route(
            "/api/user/password",
            axum::routing::patch(api::users::change_password),
        )
        .route(
            "/api/user/delete/:id",
            axum::routing::delete(api::users::delete_account),
        )
        .route(
            "/api/user/fetch",
            axum::routing::get(api::users::list_accounts),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
