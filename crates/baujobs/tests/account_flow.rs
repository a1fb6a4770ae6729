mod common;

use axum::http::StatusCode;
use baujobs::mail::templates::{RESET_SUBJECT, STATUS_SUBJECT, VERIFY_SUBJECT};
use common::TestApp;
use serde_json::json;

async fn register_and_login(app: &TestApp, email: &str, account_type: &str) -> String {
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "email": email,
                "password": "Baustelle2025",
                "vorname": "Luca",
                "nachname": "Meier",
                "accountTyp": account_type
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "Baustelle2025" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn registration_login_and_email_verification() {
    let app = TestApp::new();
    let token = register_and_login(&app, "luca@meier-holzbau.ch", "arbeitgeber").await;

    let (status, profile) = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["accountTyp"], "arbeitgeber");
    assert_eq!(profile["emailVerifiziert"], false);
    assert!(profile.get("password").is_none());

    let verification = app.token_from_mail(VERIFY_SUBJECT);
    let (status, body) = app
        .post("/api/auth/verify-email", None, json!({ "token": verification }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["emailVerifiziert"], true);

    let (status, _) = app
        .post("/api/auth/verify-email", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_registration_and_bad_credentials_are_rejected() {
    let app = TestApp::new();
    register_and_login(&app, "luca@meier-holzbau.ch", "arbeitgeber").await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "LUCA@meier-holzbau.ch", "password": "Anders2025" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "luca@meier-holzbau.ch", "password": "falsch123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/auth/profile", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reset_tokens_stop_working_once_the_password_changed() {
    let app = TestApp::new();
    register_and_login(&app, "luca@meier-holzbau.ch", "arbeitgeber").await;

    let (status, _) = app
        .post(
            "/api/auth/forgot-password",
            None,
            json!({ "email": "luca@meier-holzbau.ch" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reset = app.token_from_mail(RESET_SUBJECT);

    let (status, body) = app
        .post(
            "/api/auth/reset-password",
            None,
            json!({ "token": reset, "password": "NeuesPasswort1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = app
        .post(
            "/api/auth/reset-password",
            None,
            json!({ "token": reset, "password": "NochEinmal22" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "luca@meier-holzbau.ch", "password": "NeuesPasswort1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/forgot-password",
            None,
            json!({ "email": "unbekannt@bau.ch" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn premium_activation_and_cv_visibility() {
    let app = TestApp::new();
    let token = register_and_login(&app, "mia@bau.ch", "arbeitssuchender").await;

    let (status, body) = app
        .post(
            "/api/premium/aktivieren",
            Some(&token),
            json!({ "premiumTyp": "arbeitssuchender", "lebenslaufHervorgehoben": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["premiumFeatures"]["lebenslaufHervorgehoben"], true);

    let (status, body) = app.get("/api/premium/status", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accountTyp"], "arbeitssuchender");
    assert!(body["premiumFeatures"]["premiumBis"].is_string());

    let (status, body) = app
        .put(
            "/api/premium/lebenslauf-sichtbarkeit",
            Some(&token),
            json!({ "sichtbar": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lebenslaufSichtbar"], true);

    let (status, _) = app
        .post(
            "/api/premium/aktivieren",
            Some(&token),
            json!({ "premiumTyp": "gold" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_an_account_removes_its_seeker_profiles() {
    let app = TestApp::new();
    let token = register_and_login(&app, "mia@bau.ch", "arbeitssuchender").await;

    let (status, body) = app
        .post(
            "/api/suche-einen-job",
            Some(&token),
            json!({
                "beruf": "Zimmerer/Zimmermann/Zimmerin EFZ",
                "standort": "Luzern",
                "beschreibung": "Suche Stelle im Holzbau",
                "erfahrung": "4 Jahre",
                "ausbildung": "EFZ",
                "mobilitaet": "In der Region",
                "artDerStelle": "Vollzeit",
                "verfuegbarAb": "2026-11-01",
                "kontaktEmail": "mia@bau.ch",
                "lebenslauf": "http://localhost:10000/uploads/lebenslauf-1-1.pdf"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["kategorie"], "Hochbau");

    let (_, feed) = app.get("/api/suche-einen-job", None).await;
    assert_eq!(feed["jobs"].as_array().map(Vec::len), Some(1));

    let (status, _) = app.delete("/api/auth/account", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app
        .mailer
        .sent()
        .iter()
        .any(|mail| mail.subject == STATUS_SUBJECT));

    let (_, feed) = app.get("/api/suche-einen-job", None).await;
    assert_eq!(feed["jobs"].as_array().map(Vec::len), Some(0));
    let (status, _) = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
