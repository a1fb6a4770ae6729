use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ProfileUpdate, Registration};
use super::service::PremiumActivation;
use crate::auth::AuthUser;
use crate::context::AppContext;
use crate::error::{ApiError, Payload};

/// `/auth/*` account endpoints and `/premium/*`.
pub fn account_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/verify-email", post(verify_email_handler))
        .route("/auth/forgot-password", post(forgot_password_handler))
        .route("/auth/reset-password", post(reset_password_handler))
        .route("/auth/profile", get(profile_handler).put(update_profile_handler))
        .route("/auth/change-password", put(change_password_handler))
        .route("/auth/account", axum::routing::delete(delete_account_handler))
        .route("/premium/status", get(premium_status_handler))
        .route("/premium/aktivieren", post(activate_premium_handler))
        .route("/premium/lebenslauf-sichtbarkeit", put(cv_visibility_handler))
        .with_state(ctx)
}

#[derive(Debug, Deserialize)]
pub(crate) struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenBody {
    #[serde(default)]
    token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmailBody {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResetBody {
    #[serde(default)]
    token: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PasswordChange {
    #[serde(rename = "currentPassword", default)]
    current: String,
    #[serde(rename = "newPassword", default)]
    new: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Visibility {
    #[serde(rename = "sichtbar")]
    visible: bool,
}

pub(crate) async fn register_handler(
    State(ctx): State<Arc<AppContext>>,
    Payload(registration): Payload<Registration>,
) -> Result<Response, ApiError> {
    let user = ctx.accounts.register(registration).await?;
    let body = json!({ "message": "registration successful", "user": user });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub(crate) async fn login_handler(
    State(ctx): State<Arc<AppContext>>,
    Payload(credentials): Payload<Credentials>,
) -> Result<Response, ApiError> {
    let session = ctx
        .accounts
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(session).into_response())
}

pub(crate) async fn verify_email_handler(
    State(ctx): State<Arc<AppContext>>,
    Payload(body): Payload<TokenBody>,
) -> Result<Response, ApiError> {
    let user = ctx.accounts.verify_email(&body.token).await?;
    Ok(Json(json!({ "message": "e-mail verified", "user": user })).into_response())
}

pub(crate) async fn forgot_password_handler(
    State(ctx): State<Arc<AppContext>>,
    Payload(body): Payload<EmailBody>,
) -> Result<Response, ApiError> {
    ctx.accounts.forgot_password(&body.email).await?;
    let body = json!({
        "message": "if the address is registered, a reset link has been sent"
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn reset_password_handler(
    State(ctx): State<Arc<AppContext>>,
    Payload(body): Payload<ResetBody>,
) -> Result<Response, ApiError> {
    ctx.accounts
        .reset_password(&body.token, &body.password)
        .await?;
    Ok(Json(json!({ "message": "password updated" })).into_response())
}

pub(crate) async fn profile_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, ApiError> {
    let user = ctx.accounts.profile(&user_id).await?;
    Ok(Json(user).into_response())
}

pub(crate) async fn update_profile_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user_id): AuthUser,
    Payload(update): Payload<ProfileUpdate>,
) -> Result<Response, ApiError> {
    let user = ctx.accounts.update_profile(&user_id, update).await?;
    Ok(Json(user).into_response())
}

pub(crate) async fn change_password_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user_id): AuthUser,
    Payload(change): Payload<PasswordChange>,
) -> Result<Response, ApiError> {
    ctx.accounts
        .change_password(&user_id, &change.current, &change.new)
        .await?;
    Ok(Json(json!({ "message": "password updated" })).into_response())
}

pub(crate) async fn delete_account_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, ApiError> {
    ctx.accounts.delete_account(&user_id).await?;
    Ok(Json(json!({ "message": "account deleted" })).into_response())
}

pub(crate) async fn premium_status_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, ApiError> {
    let status = ctx.accounts.premium_status(&user_id).await?;
    Ok(Json(status).into_response())
}

pub(crate) async fn activate_premium_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user_id): AuthUser,
    Payload(activation): Payload<PremiumActivation>,
) -> Result<Response, ApiError> {
    let features = ctx.accounts.activate_premium(&user_id, activation).await?;
    let body = json!({
        "message": "premium features activated",
        "premiumFeatures": features,
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn cv_visibility_handler(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user_id): AuthUser,
    Payload(body): Payload<Visibility>,
) -> Result<Response, ApiError> {
    let visible = ctx.accounts.set_cv_visibility(&user_id, body.visible).await?;
    let body = json!({
        "message": "CV visibility updated",
        "lebenslaufSichtbar": visible,
    });
    Ok(Json(body).into_response())
}
