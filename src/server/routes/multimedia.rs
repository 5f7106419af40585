//! Multimedia association endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::multimedia::{
    KeywordMatch, MediaAssociation, MediaItem, MediaType, MultimediaStats,
};
use crate::server::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/associations", post(create_association))
        .route("/associations", get(list_associations))
        .route("/associations/:document_name", delete(remove_associations))
        .route("/search", post(search_by_keywords))
        .route("/document/:document_name", get(media_for_document))
        .route("/types/:media_type", get(media_of_type))
        .route("/stats", get(statistics))
}

/// POST /api/multimedia/associations
async fn create_association(
    State(state): State<AppState>,
    Json(association): Json<MediaAssociation>,
) -> Result<Json<MediaAssociation>> {
    if association.document_name.trim().is_empty() {
        return Err(Error::Invalid("document_name must not be empty".to_string()));
    }
    if association.media_items.is_empty() {
        return Err(Error::Invalid("media_items must not be empty".to_string()));
    }

    let created = state.multimedia().add_association(association);
    state.multimedia().save()?;
    tracing::info!(
        "added media association for {} ({} items)",
        created.document_name,
        created.media_items.len()
    );
    Ok(Json(created))
}

/// GET /api/multimedia/associations
async fn list_associations(State(state): State<AppState>) -> Json<Vec<MediaAssociation>> {
    Json(state.multimedia().all_associations())
}

#[derive(Debug, Deserialize)]
pub struct RemoveParams {
    section: Option<String>,
}

/// DELETE /api/multimedia/associations/:document_name?section=
///
/// Without a section, every association of the document is removed.
async fn remove_associations(
    State(state): State<AppState>,
    Path(document_name): Path<String>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<serde_json::Value>> {
    let removed = state
        .multimedia()
        .remove_association(&document_name, params.section.as_deref());
    if removed == 0 {
        return Err(Error::NotFound(format!(
            "no associations for '{}'",
            document_name
        )));
    }
    state.multimedia().save()?;
    Ok(Json(serde_json::json!({
        "document_name": document_name,
        "removed": removed,
    })))
}

#[derive(Debug, Deserialize)]
pub struct KeywordSearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

/// POST /api/multimedia/search
async fn search_by_keywords(
    State(state): State<AppState>,
    Json(request): Json<KeywordSearchRequest>,
) -> Result<Json<Vec<KeywordMatch>>> {
    if request.query.trim().is_empty() {
        return Err(Error::Invalid("query must not be empty".to_string()));
    }
    Ok(Json(
        state.multimedia().find_by_keywords(&request.query, request.top_k),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DocumentParams {
    page_number: Option<u32>,
}

/// GET /api/multimedia/document/:document_name?page_number=
async fn media_for_document(
    State(state): State<AppState>,
    Path(document_name): Path<String>,
    Query(params): Query<DocumentParams>,
) -> Json<Vec<MediaItem>> {
    Json(
        state
            .multimedia()
            .find_by_document(&document_name, params.page_number),
    )
}

/// GET /api/multimedia/types/:media_type
async fn media_of_type(
    State(state): State<AppState>,
    Path(media_type): Path<String>,
) -> Result<Json<Vec<MediaItem>>> {
    let parsed = MediaType::parse(&media_type).ok_or_else(|| {
        Error::Invalid(format!(
            "unknown media type '{}' (expected image, video, or gif)",
            media_type
        ))
    })?;
    Ok(Json(state.multimedia().media_by_type(parsed)))
}

/// GET /api/multimedia/stats
async fn statistics(State(state): State<AppState>) -> Json<MultimediaStats> {
    Json(state.multimedia().statistics())
}
