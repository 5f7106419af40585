//! API routes for the RAG server

pub mod chat;
pub mod documents;
pub mod multimedia;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Query and search
        .route("/query", post(query::query_rag))
        .route("/search", post(query::search_chunks))
        .route("/stats", get(query::store_stats))
        // Chat sessions
        .route("/chat", post(chat::chat_turn))
        .route("/chat/:session_id", delete(chat::clear_session))
        .route("/chat/:session_id/history", get(chat::session_history))
        // Document management - larger body limit for multipart uploads
        .route(
            "/documents/upload",
            post(documents::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/documents/:filename",
            put(documents::replace_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/documents", get(documents::list_documents))
        .route("/documents/:filename", delete(documents::delete_document))
        // Multimedia associations
        .nest("/multimedia", multimedia::routes())
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "PDF RAG service with dual vector stores and multimedia enrichment",
        "endpoints": {
            "POST /api/query": "Answer a question from the indexed documents",
            "POST /api/search": "Raw similarity search, no generation",
            "GET /api/stats": "Vector store statistics",
            "POST /api/chat": "Conversational turn with session history",
            "DELETE /api/chat/:session_id": "Drop a chat session",
            "GET /api/chat/:session_id/history": "Session message history",
            "POST /api/documents/upload": "Upload and index a PDF",
            "PUT /api/documents/:filename": "Replace a PDF (old chunks removed first)",
            "GET /api/documents": "List indexed documents",
            "DELETE /api/documents/:filename": "Remove a document and its chunks",
            "POST /api/multimedia/associations": "Create a media association",
            "GET /api/multimedia/associations": "List media associations",
            "GET /api/multimedia/stats": "Multimedia index statistics",
            "GET /pdfs/:filename": "Served PDF files"
        }
    }))
}
