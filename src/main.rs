mod api_doc;
mod auth;
mod cache;
mod comment;
mod db;
mod friendship;
mod notification;
mod post;
mod reaction;
mod routes;
mod schema_ext;
mod user;

use axum::{routing::get, Router};
use dotenvy::dotenv;
use redis::Client;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::cache::redis::RedisCache;
use crate::comment::service::CommentService;
use crate::friendship::service::FriendshipService;
use crate::notification::service::NotificationService;
use crate::post::service::PostService;
use crate::reaction::service::ReactionService;
use crate::user::service::UserService;

// Simple app config struct
#[derive(Debug, Clone)]
struct AppConfig {
    redis_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenv().ok();

    // Create connection pool
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;

    // Check if the database is initialized
    if !db::check_db_initialized(&pool).await {
        db::init_db(&pool).await?;
    }

    let app_config = AppConfig {
        redis_url: std::env::var("REDIS_URL").ok(),
    };

    // Initialize Redis cache if configured
    let redis_cache = if let Some(url) = &app_config.redis_url {
        info!("Initializing Redis cache with URL: {}", url);
        match Client::open(url.clone()) {
            Ok(client) => Some(RedisCache::new(client)),
            Err(e) => {
                error!("Failed to connect to Redis: {}", e);
                None
            }
        }
    } else {
        info!("No Redis URL configured, proceeding without cache");
        None
    };

    // Create service instances. Notifications sit underneath everything that
    // fires them.
    let notification_service = Arc::new(NotificationService::new(pool.clone()));
    let user_service = Arc::new(UserService::new(pool.clone()));
    let friendship_service = Arc::new(FriendshipService::new(
        pool.clone(),
        notification_service.clone(),
    ));
    let post_service = Arc::new(PostService::new(pool.clone(), friendship_service.clone()));
    let reaction_service = Arc::new(ReactionService::new(
        pool.clone(),
        notification_service.clone(),
    ));
    let comment_service = Arc::new(CommentService::new(
        pool.clone(),
        redis_cache,
        friendship_service.clone(),
        notification_service.clone(),
    ));

    // Build the router
    let app = Router::new()
        // API documentation
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Health routes
        .merge(routes::health::routes(pool.clone()))
        // Auth routes
        .merge(routes::auth::routes(pool.clone()))
        // User routes
        .merge(routes::users::routes(user_service))
        // Post routes
        .merge(routes::posts::routes(post_service))
        // Comment routes
        .merge(routes::comments::routes(comment_service))
        // Friendship routes
        .merge(routes::friends::routes(friendship_service))
        // Reaction routes
        .merge(routes::likes::routes(reaction_service))
        // Notification routes
        .merge(routes::notifications::routes(notification_service))
        // Welcome route
        .route(
            "/",
            get(|| async { "Welcome to Social Network Backend API" }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    // Try different ports
    let mut port = 9500;
    let max_tries = 5;
    for attempt in 1..=max_tries {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        match axum::Server::try_bind(&addr) {
            Ok(server) => {
                println!("Server started successfully at http://localhost:{}", port);
                println!("API Documentation: http://localhost:{}/docs", port);
                return server
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| e.into());
            }
            Err(_) => {
                if attempt == max_tries {
                    return Err("Failed to bind to any port".into());
                }
                port += 1;
            }
        }
    }

    Err("Failed to bind to any port".into())
}
