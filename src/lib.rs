pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::api::handlers;
use crate::api::middleware::auth::auth_middleware;
use crate::config::GatewayConfig;
use crate::services::file_service::FileService;
use crate::services::local_store::LocalStore;
use crate::services::remote::RemoteStorage;
use crate::services::staging::StagingArea;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::verify_token,
        handlers::files::list::list_files,
        handlers::files::upload::upload_file,
        handlers::files::download::download_file,
        handlers::files::manage::delete_file,
        handlers::files::manage::verify_deletion,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::auth::TokenResponse,
            handlers::files::UploadResponse,
            handlers::files::DeleteResponse,
            handlers::files::DeleteErrorResponse,
            handlers::files::ErrorResponse,
            services::local_store::FileRecord,
            services::file_service::VerificationReport,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "auth", description = "Token check"),
        (name = "files", description = "File management endpoints")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub remote: Arc<dyn RemoteStorage>,
    pub file_service: Arc<FileService>,
}

impl AppState {
    pub fn new(config: GatewayConfig, remote: Arc<dyn RemoteStorage>) -> Self {
        let file_service = Arc::new(FileService::new(
            LocalStore::new(&config.local_store_path),
            StagingArea::new(&config.staging_path),
            remote.clone(),
            &config,
        ));

        Self {
            config,
            remote,
            file_service,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_size
        .saturating_add(MULTIPART_OVERHEAD);

    // Every /api route except verify-token sits behind the bearer check
    let protected = Router::new()
        .route("/api/files", get(handlers::files::list_files))
        .route(
            "/api/upload",
            post(handlers::files::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/files/:filename", delete(handlers::files::delete_file))
        .route(
            "/api/verify-deletion/:filename",
            get(handlers::files::verify_deletion),
        )
        .route(
            "/api/download/:filename",
            get(handlers::files::download_file),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health::health_check))
        .route("/api/verify-token", post(handlers::auth::verify_token))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
