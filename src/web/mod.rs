//! Web layer
//!
//! Thin axum handlers over the services. Routing, shared state and the server loop live
//! here; request parsing is in [`extractors`] and error mapping in [`responses`].

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tracing::{info, warn};

use crate::cache::{Caches, Clock};
use crate::cdn::{CloudinaryCdn, ImageCdn, InlineImageStore};
use crate::config::Config;
use crate::database::Database;
use crate::errors::AppResult;
use crate::images::{ImageProxy, ImageVariant};
use crate::repositories::{
    AdvertiserSeaOrmRepository, LikeSeaOrmRepository, ListingSeaOrmRepository,
};
use crate::services::{AdvertiserService, LikeService, ListingService};

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;

pub use responses::{handle_error, ApiResponse};

use extractors::ImageParams;
use handlers::{advertisers, health, likes, listings};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<ListingService>,
    pub advertisers: Arc<AdvertiserService>,
    pub likes: Arc<LikeService>,
    pub caches: Caches,
    /// Per-file limit for multipart uploads
    pub upload_limit: usize,
    /// Whole-body limit
    pub request_limit: usize,
    default_quality: u8,
    max_width: u32,
}

impl AppState {
    /// Wire repositories, caches, the CDN client and services together
    pub fn build(config: &Config, database: &Database, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let caches = Caches::new(&config.cache, clock);
        let cdn = build_cdn(config)?;
        let image_proxy = Arc::new(ImageProxy::new(&config.images, caches.images.clone())?);

        let connection = database.connection();
        let listings = ListingService::new(
            Arc::new(ListingSeaOrmRepository::new(connection.clone())),
            cdn,
            caches.responses.clone(),
            caches.images.clone(),
            image_proxy,
            config.listings.clone(),
        );
        let advertisers =
            AdvertiserService::new(Arc::new(AdvertiserSeaOrmRepository::new(connection.clone())));
        let likes = LikeService::new(Arc::new(LikeSeaOrmRepository::new(connection)));

        Ok(Self {
            listings: Arc::new(listings),
            advertisers: Arc::new(advertisers),
            likes: Arc::new(likes),
            caches,
            upload_limit: config.images.max_upload_size,
            request_limit: config.web.max_request_size,
            default_quality: config.images.default_quality,
            max_width: config.images.max_width,
        })
    }

    pub fn image_variant(&self, params: &ImageParams) -> AppResult<ImageVariant> {
        ImageVariant::from_params(
            params.width,
            params.quality,
            params.format.as_deref(),
            self.default_quality,
            self.max_width,
        )
    }
}

/// Cloudinary when credentials are configured, otherwise images are kept inline
pub fn build_cdn(config: &Config) -> AppResult<Arc<dyn ImageCdn>> {
    match &config.cdn {
        Some(cdn) => {
            let client = CloudinaryCdn::new(cdn.clone(), config.images.fetch_timeout)?;
            info!(cloud = %cdn.cloud_name, "using cloudinary for image uploads");
            Ok(Arc::new(client))
        }
        None => {
            warn!("no CDN configured, uploaded images are stored inline as data URIs");
            Ok(Arc::new(InlineImageStore))
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.request_limit;

    Router::new()
        .route("/", get(health::banner))
        .route("/healthz", get(health::healthz))
        .route(
            "/api/listings",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route("/api/admin/listings", get(listings::list_listings))
        .route(
            "/api/listings/{id}",
            get(listings::get_listing)
                .patch(listings::update_listing)
                .delete(listings::delete_listing),
        )
        .route(
            "/api/listings/{id}/status",
            patch(listings::update_listing_status),
        )
        .route("/api/listings/{id}/cover", get(listings::listing_cover))
        .route(
            "/api/listings/{id}/images/{index}",
            get(listings::listing_image),
        )
        .route("/api/advertisers", post(advertisers::create_advertiser))
        .route("/api/likes", post(likes::submit_like))
        .route("/api/likes/{listing_id}", get(likes::count_likes))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(from_fn(middleware::security_headers_middleware))
        .with_state(state)
}

async fn route_not_found() -> Response {
    responses::not_found("Route not found")
}

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &Config, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid listen address {}:{}",
                    config.web.host, config.web.port
                )
            })?;

        Ok(Self {
            app: create_router(state),
            addr,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until SIGINT or SIGTERM, then drain in-flight requests
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("Failed to bind to {}", self.addr))?;
        info!(addr = %self.addr, "web server listening");

        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("web server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, shutting down gracefully");
}
