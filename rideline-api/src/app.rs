/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use rideline_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = rideline_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use rideline_shared::registrar::Registrar;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Registration service
    pub registrar: Registrar,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let registrar = Registrar::new(db.clone());
        Self {
            db,
            registrar,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                  # Liveness + database ping
/// ├── POST /register/user           # Create passenger account
/// ├── POST /register/rider          # Create rider account + vehicle
/// ├── POST /login                   # Phone + password check
/// ├── /users
/// │   ├── POST   /                  # Create user (same as /register/user)
/// │   ├── GET    /                  # List, paged by limit/startAfter
/// │   ├── GET    /:id               # Fetch by id
/// │   ├── PATCH  /:id               # Partial update
/// │   ├── DELETE /:id               # Delete (cascades to dependents)
/// │   ├── GET    /by-phone/:phone   # Fetch by phone
/// │   └── POST   /:id/addresses     # Create address for user
/// └── /addresses
///     ├── POST /                    # Create address
///     └── GET  /?user_id=...        # List, optionally filtered
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let router = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register/user", post(routes::auth::register_user))
        .route("/register/rider", post(routes::auth::register_rider))
        .route("/login", post(routes::auth::login))
        .route(
            "/users",
            post(routes::auth::register_user).get(routes::users::list_users),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/users/by-phone/:phone", get(routes::users::get_user_by_phone))
        .route("/users/:id/addresses", post(routes::addresses::create_user_address))
        .route(
            "/addresses",
            post(routes::addresses::create_address).get(routes::addresses::list_addresses),
        );

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
