mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use baujobs::payments::webhook::{WebhookVerifier, SIGNATURE_HEADER};
use chrono::Utc;
use common::{TestApp, WEBHOOK_SECRET};
use serde_json::{json, Value};

fn offer_body(title: &str) -> Value {
    json!({
        "titel": title,
        "beschreibung": "Sanierung einer Altbauwohnung in der Altstadt.",
        "standort": "Luzern",
        "artDerStelle": "Vollzeit",
        "unternehmen": "Huber Bau GmbH",
        "kontaktName": "Anna Huber",
        "kontaktEmail": "anna@huber-bau.ch"
    })
}

/// Creates an intent of `kind`, marks it paid and exchanges it for a token.
async fn paid_token(app: &TestApp, kind: &str, caller: Option<&str>) -> String {
    let (status, body) = app
        .post(
            "/api/payment/create-payment-intent",
            caller,
            json!({ "packageId": "basic", "packageName": "Basis", "type": kind }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let secret = body["clientSecret"].as_str().expect("client secret");
    let payment_id = secret.trim_end_matches("_secret").to_string();

    let (status, body) = app
        .post("/api/auth/temp-token", None, json!({ "paymentId": payment_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "requires_payment_method");

    app.gateway
        .set_status(&payment_id, "succeeded")
        .expect("known intent");
    let (status, body) = app
        .post("/api/auth/temp-token", None, json!({ "paymentId": payment_id }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().expect("publish token").to_string()
}

fn webhook_request(payload: &Value, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/payment/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder
        .body(Body::from(serde_json::to_vec(payload).expect("serialize")))
        .expect("request")
}

#[tokio::test]
async fn paid_offer_is_published_once_with_a_publish_token() {
    let app = TestApp::new();
    let token = paid_token(&app, "stellenanzeigen-aufgeben", None).await;

    let (status, offer) = app
        .post(
            "/api/stellenanzeigen-aufgeben",
            Some(&token),
            offer_body("Maurer/in EFZ gesucht"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{offer}");
    assert_eq!(offer["kategorie"], "Hochbau");
    assert!(offer.get("ersteller").is_none());

    let (status, body) = app
        .post(
            "/api/stellenanzeigen-aufgeben",
            Some(&token),
            offer_body("Maurer/in EFZ gesucht"),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap_or_default().contains("already been used"));

    let (_, feed) = app.get("/api/stellenanzeigen-aufgeben", None).await;
    assert_eq!(feed["pagination"]["total"], 1);
}

#[tokio::test]
async fn publish_tokens_are_bound_to_the_listing_type() {
    let app = TestApp::new();
    let token = paid_token(&app, "suche-einen-job", None).await;

    let (status, _) = app
        .post(
            "/api/stellenanzeigen-aufgeben",
            Some(&token),
            offer_body("Elektroinstallateur/in EFZ"),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_payment_types_are_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/payment/create-payment-intent",
            None,
            json!({ "type": "banner" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid payment type");

    let (status, _) = app.post("/api/auth/temp-token", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_premium_webhook_grants_premium() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "sara@beispiel.ch", "password": "Baustelle2025" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, login) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "sara@beispiel.ch", "password": "Baustelle2025" }),
        )
        .await;
    let session = login["token"].as_str().expect("token").to_string();
    let user_id = login["user"]["_id"].as_str().expect("user id").to_string();

    let event = json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": "pi_webhook",
            "status": "succeeded",
            "amount": 1000,
            "currency": "chf",
            "metadata": { "type": "premium", "userId": user_id }
        }}
    });
    let bytes = serde_json::to_vec(&event).expect("serialize");
    let signature = WebhookVerifier::new(WEBHOOK_SECRET).sign(&bytes, Utc::now().timestamp());

    let (status, body) = app.send(webhook_request(&event, Some(signature))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["received"], true);

    let (_, premium) = app.get("/api/premium/status", Some(&session)).await;
    assert_eq!(premium["accountTyp"], "arbeitssuchender");
    assert_eq!(premium["premiumFeatures"]["premiumTyp"], "arbeitssuchender");
    assert_eq!(premium["premiumFeatures"]["lebenslaufHervorgehoben"], true);
    assert!(premium["premiumFeatures"]["premiumBis"].is_string());
}

#[tokio::test]
async fn webhooks_with_bad_signatures_are_rejected() {
    let app = TestApp::new();
    let event = json!({
        "id": "evt_2",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_x", "status": "succeeded" } }
    });
    let bytes = serde_json::to_vec(&event).expect("serialize");
    let forged = WebhookVerifier::new("whsec_other").sign(&bytes, Utc::now().timestamp());

    let (status, _) = app.send(webhook_request(&event, Some(forged))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(webhook_request(&event, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = WebhookVerifier::new(WEBHOOK_SECRET).sign(&bytes, Utc::now().timestamp() - 3600);
    let (status, _) = app.send(webhook_request(&event, Some(stale))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
