//! Query, search, and stats endpoints

use axum::{extract::State, Json};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::store::StoreStats;
use crate::types::{QueryRequest, QueryResponse, SearchRequest, SearchResponse};

/// POST /api/query
pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    if request.question.trim().is_empty() {
        return Err(Error::Invalid("question must not be empty".to_string()));
    }
    tracing::info!("query: {}", request.question);
    let response = state.engine().query(&request).await?;
    Ok(Json(response))
}

/// POST /api/search
pub async fn search_chunks(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    if request.query.trim().is_empty() {
        return Err(Error::Invalid("query must not be empty".to_string()));
    }
    let response = state.engine().search(&request).await?;
    Ok(Json(response))
}

/// GET /api/stats
pub async fn store_stats(State(state): State<AppState>) -> Json<StoreStats> {
    Json(state.store().stats().await)
}
