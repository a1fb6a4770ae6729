use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{cv_file_name, CV_FIELD};
use crate::context::AppContext;
use crate::error::{ApiError, Payload};

/// Multipart overhead allowed on top of the file limit.
const MULTIPART_SLACK: usize = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct UploadUrlRequest {
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub key: Option<String>,
}

pub fn upload_router(ctx: Arc<AppContext>) -> Router {
    let limit = ctx.max_upload_bytes + MULTIPART_SLACK;
    Router::new()
        .route(
            "/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(limit)),
        )
        .route("/upload/upload-url", post(upload_url_handler))
        .route("/upload/download-url", get(download_url_handler))
        .with_state(ctx)
}

fn is_pdf(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    match content_type {
        Some(value) => value
            .parse::<mime::Mime>()
            .is_ok_and(|parsed| parsed.essence_str() == mime::APPLICATION_PDF.essence_str()),
        None => file_name
            .and_then(|name| mime_guess::from_path(name).first())
            .is_some_and(|guessed| guessed == mime::APPLICATION_PDF),
    }
}

pub(crate) async fn upload_handler(
    State(ctx): State<Arc<AppContext>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(CV_FIELD) {
            continue;
        }
        if !is_pdf(field.content_type(), field.file_name()) {
            return Err(ApiError::bad_request("only PDF files are allowed"));
        }
        let bytes = field.bytes().await?;
        if bytes.len() > ctx.max_upload_bytes {
            return Err(ApiError::bad_request(format!(
                "file exceeds the limit of {} bytes",
                ctx.max_upload_bytes
            )));
        }
        let url = ctx.storage.store_pdf(&cv_file_name(), bytes.to_vec()).await?;
        let body = json!({
            "message": "CV uploaded",
            "lebenslaufUrl": url,
        });
        return Ok(Json(body).into_response());
    }
    Err(ApiError::bad_request("no file uploaded"))
}

pub(crate) async fn upload_url_handler(
    State(ctx): State<Arc<AppContext>>,
    Payload(request): Payload<UploadUrlRequest>,
) -> Result<Response, ApiError> {
    let file_name = request
        .file_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("fileName is required"))?;
    let content_type = request
        .content_type
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .to_string()
        });
    let upload = ctx.storage.presign_upload(&file_name, &content_type).await?;
    Ok(Json(upload).into_response())
}

pub(crate) async fn download_url_handler(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let key = query
        .key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("key is required"))?;
    let url = ctx.storage.presign_download(&key).await?;
    Ok(Json(json!({ "url": url })).into_response())
}
