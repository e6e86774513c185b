//! Image upload service
//!
//! Accepts PNG and JPEG images over multipart HTTP, stores them under
//! collision-free generated names and serves them back from the upload
//! directory.

pub mod config_types;
pub mod error;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod storage;
pub mod utils;


use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

pub use config_types::UploadServiceConfig;
pub use error::{UploadError, UploadResult};
pub use policy::UploadPolicy;
pub use storage::DiskStorage;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state containing all services and configuration
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<UploadPolicy>,
    pub storage: Arc<DiskStorage>,
    pub config: Arc<UploadServiceConfig>,
}

/// Initialize all services. Creates the upload directory.
pub async fn initialize_services(config: Arc<UploadServiceConfig>) -> UploadResult<AppState> {
    info!("Initializing services...");

    let policy = Arc::new(UploadPolicy::initialize(&config.upload).await?);
    let storage = Arc::new(DiskStorage::new());

    Ok(AppState {
        policy,
        storage,
        config,
    })
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.policy.max_file_size())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let public_path = state
        .config
        .upload
        .public_path
        .trim_end_matches('/')
        .to_string();
    let uploads = ServeDir::new(state.policy.upload_dir());

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/v1/images/upload",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .nest_service(&public_path, uploads)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
