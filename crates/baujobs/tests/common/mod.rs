#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use baujobs::context::{AppContext, Backends, Settings};
use baujobs::mail::MemoryMailer;
use baujobs::payments::MemoryGateway;
use baujobs::storage::{FileStore, LocalStore, DEFAULT_MAX_UPLOAD_BYTES};
use serde_json::Value;
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_integration";

pub struct TestApp {
    pub router: Router,
    pub ctx: Arc<AppContext>,
    pub mailer: Arc<MemoryMailer>,
    pub gateway: Arc<MemoryGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(LocalStore::new(
            "uploads",
            "http://localhost:10000",
        )))
    }

    pub fn with_storage(storage: Arc<dyn FileStore>) -> Self {
        Self::with_upload_limit(storage, DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_upload_limit(storage: Arc<dyn FileStore>, max_upload_bytes: usize) -> Self {
        let mailer = Arc::new(MemoryMailer::default());
        let gateway = Arc::new(MemoryGateway::default());
        let settings = Settings {
            jwt_secret: "integration-secret".to_string(),
            frontend_url: "https://baujobs.ch".to_string(),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            max_upload_bytes,
            ..Settings::default()
        };
        let ctx = Arc::new(AppContext::new(
            settings,
            Backends::in_memory(),
            mailer.clone(),
            gateway.clone(),
            storage,
        ));
        Self {
            router: baujobs::api_router(ctx.clone()),
            ctx,
            mailer,
            gateway,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, token, &body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(json_request("PUT", uri, token, &body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(empty_request("GET", uri, token)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(empty_request("DELETE", uri, token)).await
    }

    /// Token from the link in the most recent mail with `subject`.
    pub fn token_from_mail(&self, subject: &str) -> String {
        let mail = self
            .mailer
            .sent()
            .into_iter()
            .rev()
            .find(|mail| mail.subject == subject)
            .expect("mail sent");
        let start = mail.html.find("token=").expect("token link") + "token=".len();
        mail.html[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            .collect()
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
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

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json body")
}
