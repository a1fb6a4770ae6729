use crate::cli::ServeArgs;
use crate::infra::{self, AppState};
use crate::routes::with_service_routes;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use baujobs::config::{AppConfig, StorageBackend};
use baujobs::error::AppError;
use baujobs::{api_router, telemetry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const BODY_SLACK_BYTES: usize = 64 * 1024;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ctx = Arc::new(infra::context(&config).await?);
    let body_limit = ctx.max_upload_bytes + BODY_SLACK_BYTES;

    let mut app = with_service_routes(api_router(ctx));
    if let StorageBackend::Local { directory } = &config.storage.backend {
        tokio::fs::create_dir_all(directory).await?;
        app = app.nest_service("/uploads", ServeDir::new(directory));
    }

    let app = app
        .layer(Extension(app_state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "baujobs api ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
