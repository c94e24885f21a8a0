//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    admin, favorites, health, profile, publications, streams, submissions,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
    pub jwt_service: Arc<JwtService>,
    /// `None` when running on in-memory stores
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(deps: ServerDeps, jwt_service: Arc<JwtService>, db_pool: Option<PgPool>) -> Self {
        Self {
            deps,
            jwt_service,
            db_pool,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let jwt_service = state.jwt_service.clone();

    let api = Router::new()
        // Profile + devices
        .route("/profile", post(profile::upsert_profile_handler))
        .route(
            "/push-tokens",
            post(profile::register_push_token_handler).delete(profile::remove_push_token_handler),
        )
        // Submissions
        .route("/submissions", post(submissions::create_handler))
        .route("/submissions/mine", get(submissions::list_mine_handler))
        .route("/submissions/mine/stream", get(streams::my_submissions_stream))
        .route(
            "/submissions/:id",
            get(submissions::get_handler)
                .patch(submissions::update_handler)
                .delete(submissions::delete_handler),
        )
        // Publications
        .route("/publications", get(publications::list_handler))
        .route("/publications/mine", get(publications::list_mine_handler))
        .route("/publications/mine/stream", get(streams::my_publications_stream))
        .route(
            "/publications/:id",
            get(publications::get_handler)
                .patch(publications::update_handler)
                .delete(publications::delete_handler),
        )
        .route("/publications/:id/edits", post(publications::create_edit_handler))
        .route(
            "/publications/:id/edits/mine",
            get(publications::get_my_edit_handler),
        )
        // Favorites
        .route("/favorites", get(favorites::list_handler))
        .route("/favorites/count", get(favorites::count_handler))
        .route("/favorites/stream", get(streams::my_favorites_stream))
        .route(
            "/favorites/:recipe_id",
            get(favorites::status_handler)
                .post(favorites::add_handler)
                .delete(favorites::remove_handler),
        )
        .route("/favorites/:recipe_id/toggle", post(favorites::toggle_handler))
        // Admin
        .route("/admin/submissions", get(admin::queue_handler))
        .route("/admin/submissions/stream", get(streams::queue_stream))
        .route("/admin/submissions/:id/approve", post(admin::approve_handler))
        .route("/admin/submissions/:id/decline", post(admin::decline_handler))
        .route("/admin/publications/:id", delete(admin::delete_published_handler))
        .route("/admin/actions", get(admin::actions_handler))
        .route("/admin/stats", get(admin::stats_handler));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api", api)
        .layer(middleware::from_fn(move |request, next| {
            jwt_auth_middleware(jwt_service.clone(), request, next)
        }))
        .layer(Extension(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
