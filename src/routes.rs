// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::auth_guard, tenancy::tenant_guard},
};

pub fn app(app_state: AppState) -> Router {
    // Rotas com Auth + Access Gate (org/tenant)
    let scoped_routes = Router::new()
        .route("/api/tenants", get(handlers::tenancy::list_tenants))
        .route(
            "/api/tenant/profile",
            get(handlers::tenancy::get_profile).put(handlers::tenancy::put_profile),
        )
        .route(
            "/api/tenant/references",
            get(handlers::tenancy::get_references).put(handlers::tenancy::put_references),
        )
        .route(
            "/api/tenant/layout",
            get(handlers::tenancy::get_layout).put(handlers::tenancy::put_layout),
        )
        .route("/api/proposals", get(handlers::proposals::list_proposals))
        .route("/api/proposals/bulk-delete", post(handlers::proposals::bulk_delete))
        .route(
            "/api/proposals/{slug}",
            get(handlers::proposals::get_proposal).delete(handlers::proposals::delete_proposal),
        )
        .route("/api/proposals/{slug}/draft", put(handlers::proposals::save_draft))
        .route("/api/proposals/{slug}/publish", post(handlers::proposals::publish_proposal))
        .route("/api/proposals/{slug}/render", get(handlers::proposals::render_proposal))
        // A última camada roda primeiro: auth_guard -> tenant_guard -> handler
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/sections", get(handlers::sections::list_sections))
        .route(
            "/api/public/proposals/{slug}",
            get(handlers::proposals::render_public_proposal),
        )
        .merge(scoped_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
