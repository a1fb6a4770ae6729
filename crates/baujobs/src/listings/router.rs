use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{
    JobOfferPatch, JobOfferSubmission, LegacyJobPatch, LegacyJobSubmission, ListingId,
    SeekerPatch, SeekerSubmission,
};
use super::query::FeedQuery;
use crate::auth::{AuthUser, Publisher};
use crate::context::AppContext;
use crate::error::{ApiError, Payload};

/// Job offers, job-seeker profiles and the legacy job list.
pub fn listing_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route(
            "/stellenanzeigen-aufgeben",
            get(offer_feed_handler).post(create_offer_handler),
        )
        .route("/stellenanzeigen-aufgeben/meine", get(my_offers_handler))
        .route(
            "/stellenanzeigen-aufgeben/:id",
            get(offer_handler)
                .put(update_offer_handler)
                .delete(delete_offer_handler),
        )
        .route(
            "/suche-einen-job",
            get(seeker_feed_handler).post(create_seeker_handler),
        )
        .route("/suche-einen-job/meine", get(my_seekers_handler))
        .route(
            "/suche-einen-job/:id",
            get(seeker_handler)
                .put(update_seeker_handler)
                .delete(delete_seeker_handler),
        )
        .route("/jobs", get(legacy_jobs_handler).post(create_legacy_job_handler))
        .route(
            "/jobs/:id",
            get(legacy_job_handler)
                .put(update_legacy_job_handler)
                .delete(delete_legacy_job_handler),
        )
        .with_state(ctx)
}

pub(crate) async fn offer_feed_handler(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let page = ctx.listings.offer_feed(&query, Utc::now()).await?;
    let body = json!({
        "stellenanzeigen": page.items,
        "pagination": page.pagination,
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn offer_handler(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let offer = ctx.listings.offer(&ListingId(id)).await?;
    Ok(Json(offer).into_response())
}

pub(crate) async fn create_offer_handler(
    State(ctx): State<Arc<AppContext>>,
    publisher: Publisher,
    Payload(submission): Payload<JobOfferSubmission>,
) -> Result<Response, ApiError> {
    let offer = ctx
        .listings
        .create_offer(publisher, submission, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(offer)).into_response())
}

pub(crate) async fn update_offer_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    Payload(patch): Payload<JobOfferPatch>,
) -> Result<Response, ApiError> {
    let offer = ctx
        .listings
        .update_offer(&caller, &ListingId(id), patch)
        .await?;
    Ok(Json(offer).into_response())
}

pub(crate) async fn delete_offer_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    ctx.listings.delete_offer(&caller, &ListingId(id)).await?;
    Ok(Json(json!({ "message": "job offer deleted" })).into_response())
}

pub(crate) async fn my_offers_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
) -> Result<Response, ApiError> {
    let owned = ctx.listings.my_offers(&caller, Utc::now()).await?;
    let body = json!({
        "total": owned.live.len(),
        "stellenanzeigen": owned.live,
        "stats": owned.stats,
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn seeker_feed_handler(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let page = ctx.listings.seeker_feed(&query, Utc::now()).await?;
    let body = json!({
        "jobs": page.items,
        "pagination": page.pagination,
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn seeker_handler(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let profile = ctx.listings.seeker(&ListingId(id)).await?;
    Ok(Json(profile).into_response())
}

pub(crate) async fn create_seeker_handler(
    State(ctx): State<Arc<AppContext>>,
    publisher: Publisher,
    Payload(submission): Payload<SeekerSubmission>,
) -> Result<Response, ApiError> {
    let profile = ctx
        .listings
        .create_seeker(publisher, submission, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(profile)).into_response())
}

pub(crate) async fn update_seeker_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    Payload(patch): Payload<SeekerPatch>,
) -> Result<Response, ApiError> {
    let profile = ctx
        .listings
        .update_seeker(&caller, &ListingId(id), patch)
        .await?;
    Ok(Json(profile).into_response())
}

pub(crate) async fn delete_seeker_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    ctx.listings.delete_seeker(&caller, &ListingId(id)).await?;
    Ok(Json(json!({ "message": "job seeker profile deleted" })).into_response())
}

pub(crate) async fn my_seekers_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(caller): AuthUser,
) -> Result<Response, ApiError> {
    let owned = ctx.listings.my_seekers(&caller, Utc::now()).await?;
    let body = json!({
        "total": owned.live.len(),
        "stellengesuche": owned.live,
        "stats": owned.stats,
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn legacy_jobs_handler(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Response, ApiError> {
    let jobs = ctx.listings.legacy_jobs().await?;
    Ok(Json(jobs).into_response())
}

pub(crate) async fn legacy_job_handler(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = ctx.listings.legacy_job(&ListingId(id)).await?;
    Ok(Json(job).into_response())
}

pub(crate) async fn create_legacy_job_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(_caller): AuthUser,
    Payload(submission): Payload<LegacyJobSubmission>,
) -> Result<Response, ApiError> {
    let job = ctx
        .listings
        .create_legacy_job(submission, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

pub(crate) async fn update_legacy_job_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
    Payload(patch): Payload<LegacyJobPatch>,
) -> Result<Response, ApiError> {
    let job = ctx
        .listings
        .update_legacy_job(&ListingId(id), patch)
        .await?;
    Ok(Json(job).into_response())
}

pub(crate) async fn delete_legacy_job_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    ctx.listings.delete_legacy_job(&ListingId(id)).await?;
    Ok(Json(json!({ "message": "job deleted" })).into_response())
}
