pub mod config;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod schemas;
pub mod services;

use std::sync::Arc;

use crate::config::Config;
use crate::handlers::galleries;
use crate::middleware::{auth::optional_auth_middleware, simple_http_logging_middleware};
use crate::services::auth::SecurityAddon;
use crate::services::database::{establish_connection, DatabaseConnection};
use crate::services::thumbnail::TeaserStorage;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// multipart 其余字段预留的空间
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub storage: TeaserStorage,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        logging::log_startup_info(&config);

        let db = establish_connection(&config.database).await?;
        Ok(Self::with_connection(db, config))
    }

    pub fn with_connection(db: DatabaseConnection, config: Config) -> Self {
        let storage = TeaserStorage::new(config.media.root.clone());
        Self {
            db,
            config: Arc::new(config),
            storage,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        galleries::list_galleries,
        galleries::list_gallery_ids,
        galleries::list_user_galleries,
        galleries::get_gallery,
        galleries::create_gallery,
        galleries::edit_gallery,
        galleries::delete_gallery,
        galleries::delete_user_galleries,
        galleries::list_gallery_images,
        galleries::check_gallery_ownership,
        galleries::get_teaser_luminance
    ),
    components(
        schemas(
            schemas::gallery::GalleryResponse,
            schemas::gallery::ImageResponse,
            schemas::gallery::GalleryIdsResponse,
            schemas::gallery::CreateGalleryRequest,
            schemas::gallery::EditGalleryRequest,
            schemas::gallery::OwnershipResponse,
            schemas::gallery::LuminanceResponse,
            schemas::gallery::DeletedResponse,
            schemas::gallery::SuccessResponse,
            services::luminance::Tone,
            crate::errors::ApiErrorResponse,
            crate::errors::ApiError
        )
    ),
    modifiers(&SecurityAddon),
    tags((name = "galleries", description = "Gallery management endpoints"))
)]
pub struct ApiDoc;

pub fn create_app(app_state: AppState) -> Router {
    let body_limit = app_state.config.media.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/v2/galleries",
            get(galleries::list_galleries).post(galleries::create_gallery),
        )
        .route("/v2/galleries/ids", get(galleries::list_gallery_ids))
        .route(
            "/v2/galleries/{gallery_id}",
            get(galleries::get_gallery)
                .put(galleries::edit_gallery)
                .delete(galleries::delete_gallery),
        )
        .route(
            "/v2/galleries/{gallery_id}/images",
            get(galleries::list_gallery_images),
        )
        .route(
            "/v2/galleries/{gallery_id}/ownership",
            get(galleries::check_gallery_ownership),
        )
        .route(
            "/v2/galleries/{gallery_id}/teaser/luminance",
            get(galleries::get_teaser_luminance),
        )
        .route(
            "/v2/users/{user_id}/galleries",
            get(galleries::list_user_galleries).delete(galleries::delete_user_galleries),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            optional_auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Swagger UI
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
        .layer(axum_middleware::from_fn(simple_http_logging_middleware))
        .layer(CorsLayer::permissive())
}
