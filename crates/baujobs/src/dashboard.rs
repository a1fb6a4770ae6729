use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use crate::auth::AuthUser;
use crate::context::AppContext;
use crate::error::ApiError;

pub fn dashboard_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/dashboard/stats", get(stats_handler))
        .with_state(ctx)
}

pub(crate) async fn stats_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
) -> Result<Response, ApiError> {
    let stats = ctx.listings.dashboard(&caller, Utc::now()).await?;
    Ok(Json(stats).into_response())
}
