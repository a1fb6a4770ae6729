//! Swiss locality autocomplete.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::catalog;
use crate::context::AppContext;
use crate::error::ApiError;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_RESULTS: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Localities containing `query`, or nothing for queries under two characters.
pub fn search(query: &str) -> Vec<&'static str> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    catalog::search_localities(query, MAX_RESULTS)
}

pub fn location_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/locations/search", get(search_handler))
        .with_state(ctx)
}

pub(crate) async fn search_handler(
    State(_ctx): State<Arc<AppContext>>,
    Query(query): Query<LocationQuery>,
) -> Result<Response, ApiError> {
    let locations = search(query.q.as_deref().unwrap_or_default());
    Ok(Json(json!({ "locations": locations })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_queries_return_nothing() {
        assert!(search("").is_empty());
        assert!(search("Z").is_empty());
        assert!(search(" Z ").is_empty());
    }

    #[test]
    fn matches_are_case_insensitive_and_capped() {
        let hits = search("zür");
        assert!(hits.contains(&"Zürich"));
        assert!(search("er").len() <= MAX_RESULTS);
        assert!(search("ER").iter().all(|name| name.to_lowercase().contains("er")));
    }
}
