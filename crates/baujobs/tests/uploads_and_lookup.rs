mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use baujobs::storage::LocalStore;
use common::TestApp;
use serde_json::json;

const BOUNDARY: &str = "baujobs-boundary";

fn multipart_upload(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn pdf_uploads_land_in_local_storage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = TestApp::with_storage(Arc::new(LocalStore::new(
        dir.path(),
        "http://localhost:10000",
    )));

    let (status, body) = app
        .send(multipart_upload(
            "lebenslauf",
            "cv.pdf",
            "application/pdf",
            b"%PDF-1.4 lebenslauf",
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let url = body["lebenslaufUrl"].as_str().expect("url");
    let name = url
        .strip_prefix("http://localhost:10000/uploads/")
        .expect("public url");
    assert!(name.starts_with("lebenslauf-") && name.ends_with(".pdf"));
    let stored = std::fs::read(dir.path().join(name)).expect("stored file");
    assert_eq!(stored, b"%PDF-1.4 lebenslauf");
}

#[tokio::test]
async fn uploads_reject_other_file_types_and_missing_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = TestApp::with_storage(Arc::new(LocalStore::new(
        dir.path(),
        "http://localhost:10000",
    )));

    let (status, body) = app
        .send(multipart_upload("lebenslauf", "cv.png", "image/png", b"png"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "only PDF files are allowed");

    let (status, body) = app
        .send(multipart_upload("foto", "cv.pdf", "application/pdf", b"%PDF"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "no file uploaded");
}

#[tokio::test]
async fn oversized_uploads_are_rejected() {
    const LIMIT: usize = 1024;
    let dir = tempfile::tempdir().expect("tempdir");
    let app = TestApp::with_upload_limit(
        Arc::new(LocalStore::new(dir.path(), "http://localhost:10000")),
        LIMIT,
    );

    let mut pdf = b"%PDF-1.4 ".to_vec();
    pdf.resize(LIMIT, b'x');
    let (status, body) = app
        .send(multipart_upload("lebenslauf", "cv.pdf", "application/pdf", &pdf))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    pdf.push(b'x');
    let (status, body) = app
        .send(multipart_upload("lebenslauf", "cv.pdf", "application/pdf", &pdf))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "file exceeds the limit of 1024 bytes");

    pdf.resize(LIMIT + 64 * 1024 + 1, b'x');
    let (status, _) = app
        .send(multipart_upload("lebenslauf", "cv.pdf", "application/pdf", &pdf))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = std::fs::read_dir(dir.path()).expect("upload dir").count();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn local_storage_cannot_presign() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/api/upload/upload-url",
            None,
            json!({ "fileName": "cv.pdf", "contentType": "application/pdf" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/upload/download-url", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "key is required");
}

#[tokio::test]
async fn location_search_needs_two_characters() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/locations/search?q=z", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locations"], json!([]));

    let (_, body) = app.get("/api/locations/search?q=z%C3%BCr", None).await;
    let found = body["locations"].as_array().expect("locations");
    assert!(!found.is_empty() && found.len() <= 10);
}

#[tokio::test]
async fn dashboard_counts_live_listings() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/dashboard/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.post(
        "/api/auth/register",
        None,
        json!({
            "email": "bauleitung@keller-bau.ch",
            "password": "Baustelle2025",
            "accountTyp": "arbeitgeber"
        }),
    )
    .await;
    let (_, login) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "bauleitung@keller-bau.ch", "password": "Baustelle2025" }),
        )
        .await;
    let token = login["token"].as_str().expect("token").to_string();

    let (status, _) = app
        .post(
            "/api/stellenanzeigen-aufgeben",
            Some(&token),
            json!({
                "titel": "Polier/in gesucht",
                "beschreibung": "Leitung einer Baustelle im Hochbau.",
                "standort": "Aarau",
                "artDerStelle": "Vollzeit",
                "kontaktName": "Marco Keller",
                "kontaktEmail": "jobs@keller-bau.ch"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, stats) = app.get("/api/dashboard/stats", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["activeApplications"], 1);
    assert_eq!(stats["savedJobs"], 0);
    assert_eq!(stats["totalJobs"], 1);
}
