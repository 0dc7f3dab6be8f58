pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ServerConfig;
use crate::services::storage::LocalStorageService;
use crate::services::upload_service::UploadService;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_files,
        api::handlers::upload::widget_config,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upload::UploadAck,
            api::handlers::upload::UploadForm,
            api::handlers::health::HealthResponse,
            api::error::ErrorBody,
            config::WidgetConfig,
        )
    ),
    tags(
        (name = "upload", description = "File upload endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub uploads: Arc<UploadService>,
}

impl AppState {
    /// Builds the state for `config`, creating the upload directories.
    pub async fn from_config(config: ServerConfig) -> std::io::Result<Self> {
        let storage =
            LocalStorageService::setup(config.upload_dir.clone(), config.staging_dir()).await?;
        let uploads = UploadService::new(Arc::new(storage), config.commit_mode);

        Ok(Self {
            config: Arc::new(config),
            uploads: Arc::new(uploads),
        })
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_app(state: AppState) -> Router {
    let assets = Router::new()
        .fallback_service(ServeDir::new(&state.config.assets_dir))
        .layer(from_fn_with_state(
            state.config.cache_max_age,
            api::middleware::static_assets::cache_control,
        ))
        .layer(from_fn(api::middleware::static_assets::log_stylesheet_requests));

    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/", get(api::handlers::assets::redirect_to_index))
        .route(
            "/upload",
            post(api::handlers::upload::upload_files)
                .layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/upload/config", get(api::handlers::upload::widget_config))
        .route("/health", get(api::handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback_service(assets)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
