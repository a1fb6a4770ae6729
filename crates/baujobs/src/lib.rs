pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod listings;
pub mod locations;
pub mod mail;
pub mod maintenance;
pub mod payments;
pub mod storage;
pub mod store;
pub mod telemetry;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::head;
use axum::Router;

pub use context::{AppContext, Backends, Settings};

/// Every JSON endpoint, mounted under `/api`.
pub fn api_router(ctx: Arc<AppContext>) -> Router {
    let api = Router::new()
        .route("/ping", head(ping))
        .merge(accounts::account_router(ctx.clone()))
        .merge(listings::listing_router(ctx.clone()))
        .merge(payments::payment_router(ctx.clone()))
        .merge(storage::upload_router(ctx.clone()))
        .merge(locations::location_router(ctx.clone()))
        .merge(dashboard::dashboard_router(ctx));
    Router::new().nest("/api", api)
}

async fn ping() -> StatusCode {
    StatusCode::OK
}
