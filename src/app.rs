use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, health, plans, superadmin, uploads, weddings};
use crate::storage::{BlobStore, FilesystemBlobStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub blobs: Arc<dyn BlobStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, blobs: Arc<dyn BlobStore>, config: AppConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            blobs,
            config: Arc::new(config),
        }
    }
}

/// Builds the router from environment configuration with a filesystem blob store.
pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let config = AppConfig::from_env()?;
    let blobs = FilesystemBlobStore::new(config.blob_storage_dir.clone()).await?;

    tracing::info!(blob_root = %config.blob_storage_dir.display(), "blob store ready");
    let state = AppState::new(pool, jwt_config, Arc::new(blobs), config);
    Ok(build_router(state))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/password", put(auth::change_password));

    let wedding_routes = Router::new()
        .route("/", post(weddings::save_wedding))
        .route("/my", get(weddings::my_wedding))
        .route("/my/share", get(weddings::share_link))
        .route("/plan", put(weddings::change_plan))
        .route("/toggle-upload", put(weddings::toggle_upload))
        .route("/:id/public", get(weddings::public_wedding));

    // Upload handlers enforce their own size caps while reading the multipart stream.
    let upload_routes = Router::new()
        .route("/guest/:wedding_id", post(uploads::guest_upload))
        .route("/cover", post(uploads::upload_cover))
        .layer(DefaultBodyLimit::disable())
        .route("/my", get(uploads::my_uploads))
        .route("/download/:id", get(uploads::download))
        .route("/cover-image/:wedding_id", get(uploads::cover_image))
        .route("/:id", delete(uploads::delete_upload));

    let super_routes = Router::new()
        .route("/stats", get(superadmin::stats))
        .route("/weddings", get(superadmin::list_weddings))
        .route("/weddings/:id/disable", put(superadmin::disable_wedding))
        .route("/weddings/:id/enable", put(superadmin::enable_wedding))
        .route("/weddings/:id/extend-plan", put(superadmin::extend_plan))
        .route("/uploads/:id", delete(superadmin::delete_upload))
        .route("/users", get(superadmin::list_users));

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/plans", get(plans::list_plans))
        .nest("/auth", auth_routes)
        .nest("/weddings", wedding_routes)
        .nest("/uploads", upload_routes)
        .nest("/super", super_routes);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
