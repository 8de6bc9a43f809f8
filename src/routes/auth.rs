use crate::auth::controller;
use crate::auth::middleware::auth_middleware;
use axum::{middleware, routing::post, Router};
use sqlx::PgPool;

/// Authentication routes for registration, login and logout
pub fn routes(pool: PgPool) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(controller::register))
        .route("/api/auth/login", post(controller::login))
        .with_state(pool.clone());

    let private_routes = Router::new()
        .route("/api/auth/logout", post(controller::logout))
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(pool);

    public_routes.merge(private_routes)
}
