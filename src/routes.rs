//! HTTP Routes
//! Mission: Wire login, protected resources and health into one router

use crate::auth::{
    api as auth_api, auth_middleware, AuthState, RequiredRoles, RouteGuard, ROLE_ADMIN,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const HELLO_MESSAGE: &str = "Hello! You reached a protected endpoint.";
pub const ADMIN_MESSAGE: &str = "Welcome, administrator! This resource is restricted.";

/// Build the full application router.
pub fn build_router(auth_state: AuthState) -> Router {
    let guard = auth_state.guard.clone();

    // Login is the only public auth route
    let auth_router = Router::new()
        .route("/api/auth/login", post(auth_api::login))
        .with_state(auth_state);

    // Any authenticated principal
    let authenticated_routes = Router::new()
        .route("/api/hello", get(hello))
        .route("/api/me", get(auth_api::get_current_principal))
        .route_layer(middleware::from_fn_with_state(
            RouteGuard::any_authenticated(guard.clone()),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/api/admin", get(admin))
        .route_layer(middleware::from_fn_with_state(
            RouteGuard::new(guard, RequiredRoles::single(ROLE_ADMIN)),
            auth_middleware,
        ));

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .merge(auth_router)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn hello() -> &'static str {
    HELLO_MESSAGE
}

async fn admin() -> &'static str {
    ADMIN_MESSAGE
}

async fn health_check() -> &'static str {
    "ok"
}
