use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use serde_json::Value;

use crate::accounts::domain::{Registration, UserId};
use crate::auth::Publisher;
use crate::context::{AppContext, Backends, Settings};
use crate::listings::domain::{JobOfferSubmission, SeekerSubmission};
use crate::mail::MemoryMailer;
use crate::payments::MemoryGateway;
use crate::storage::LocalStore;

pub(super) fn context() -> Arc<AppContext> {
    Arc::new(AppContext::new(
        Settings::default(),
        Backends::in_memory(),
        Arc::new(MemoryMailer::default()),
        Arc::new(MemoryGateway::default()),
        Arc::new(LocalStore::new("uploads", "http://localhost:10000")),
    ))
}

/// Registers a user and returns its id with a session token.
pub(super) async fn register(
    ctx: &AppContext,
    email: &str,
    account_type: &str,
) -> (UserId, String) {
    let user = ctx
        .accounts
        .register(Registration {
            email: email.to_string(),
            password: "Baustelle2025".to_string(),
            first_name: "Nina".to_string(),
            last_name: "Huber".to_string(),
            account_type: Some(account_type.to_string()),
            ..Registration::default()
        })
        .await
        .expect("registered");
    let token = ctx.tokens.issue_session(&user.id).expect("session token");
    (user.id, token)
}

pub(super) fn offer_submission(title: &str) -> JobOfferSubmission {
    JobOfferSubmission {
        title: Some(title.to_string()),
        description: Some("Neubau Mehrfamilienhaus, Start im Frühling.".to_string()),
        location: Some("Winterthur".to_string()),
        employment_type: Some("Vollzeit".to_string()),
        company: Some("Keller Bau AG".to_string()),
        contact_name: Some("Marco Keller".to_string()),
        contact_email: Some("jobs@keller-bau.ch".to_string()),
        contact_phone: None,
        duration: None,
    }
}

pub(super) fn seeker_submission(occupation: &str) -> SeekerSubmission {
    SeekerSubmission {
        occupation: Some(occupation.to_string()),
        category: None,
        location: Some("Bern".to_string()),
        description: Some("Erfahrener Handwerker sucht neue Herausforderung.".to_string()),
        experience: Some("8 Jahre".to_string()),
        education: Some("EFZ".to_string()),
        skills: vec!["Schalungsbau".to_string()],
        languages: vec!["Deutsch".to_string()],
        mobility: Some("Schweizweit".to_string()),
        employment_type: Some("Vollzeit".to_string()),
        available_from: Some("2026-03-01".to_string()),
        contact_email: Some("mia@bau.ch".to_string()),
        contact_phone: None,
        cv: Some("http://localhost:10000/uploads/lebenslauf-1-1.pdf".to_string()),
        cover_letter: None,
    }
}

pub(super) fn paid(payment_id: &str, kind: &str, user: Option<&UserId>) -> Publisher {
    let mut metadata = BTreeMap::from([("type".to_string(), kind.to_string())]);
    if let Some(user) = user {
        metadata.insert("userId".to_string(), user.0.clone());
    }
    Publisher::Payment {
        payment_id: payment_id.to_string(),
        metadata,
    }
}

pub(super) fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).expect("serialize")))
        .expect("request")
}

pub(super) async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
