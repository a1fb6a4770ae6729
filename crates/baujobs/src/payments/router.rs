use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::service::{IntentRequest, TempToken};
use super::webhook::SIGNATURE_HEADER;
use crate::auth::OptionalUser;
use crate::context::AppContext;
use crate::error::{ApiError, Payload};

#[derive(Debug, Default, Deserialize)]
pub struct TempTokenRequest {
    #[serde(rename = "paymentId", default)]
    pub payment_id: Option<String>,
}

/// Checkout, provider webhooks and the paid-publish token exchange.
pub fn payment_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route(
            "/payment/create-payment-intent",
            post(create_intent_handler),
        )
        .route("/payment/webhook", post(webhook_handler))
        .route("/auth/temp-token", post(temp_token_handler))
        .with_state(ctx)
}

pub(crate) async fn create_intent_handler(
    State(ctx): State<Arc<AppContext>>,
    OptionalUser(caller): OptionalUser,
    Payload(request): Payload<IntentRequest>,
) -> Result<Response, ApiError> {
    let client_secret = ctx.payments.create_intent(request, caller).await?;
    Ok(Json(json!({ "clientSecret": client_secret })).into_response())
}

pub(crate) async fn temp_token_handler(
    State(ctx): State<Arc<AppContext>>,
    Payload(request): Payload<TempTokenRequest>,
) -> Result<Response, ApiError> {
    match ctx.payments.temp_token(request.payment_id.as_deref()).await? {
        TempToken::Issued(token) => Ok(Json(json!({ "token": token })).into_response()),
        TempToken::NotSucceeded(status) => {
            let body = json!({
                "message": "payment has not succeeded",
                "status": status,
            });
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

pub(crate) async fn webhook_handler(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    ctx.payments
        .handle_webhook(&body, signature, Utc::now())
        .await?;
    Ok(Json(json!({ "received": true })).into_response())
}
