//! Document management endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::IngestStats;

#[derive(Debug, Serialize)]
pub struct DocumentList {
    pub documents: Vec<String>,
    pub total: usize,
    pub backend: String,
}

/// GET /api/documents
///
/// The source list comes from store stats; in dual mode it is the union
/// of both backends.
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentList> {
    let stats = state.store().stats().await;
    Json(DocumentList {
        total: stats.sources.len(),
        documents: stats.sources,
        backend: stats.backend,
    })
}

/// POST /api/documents/upload
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<IngestStats>> {
    let (filename, bytes) = read_pdf_field(multipart).await?;
    ingest_upload(&state, &filename, &bytes).await
}

/// PUT /api/documents/:filename
///
/// Replace semantics: the old chunks are removed before re-ingestion so a
/// modified file does not accumulate duplicates.
pub async fn replace_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    multipart: Multipart,
) -> Result<Json<IngestStats>> {
    let (_, bytes) = read_pdf_field(multipart).await?;
    if !state.engine().delete_document(&filename).await {
        tracing::warn!("failed to clear old chunks for {}; re-ingesting anyway", filename);
    }
    ingest_upload(&state, &filename, &bytes).await
}

/// DELETE /api/documents/:filename
pub async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.engine().delete_document(&filename).await;
    if !deleted {
        return Err(Error::Backend(format!(
            "failed to delete chunks for {}",
            filename
        )));
    }

    let pdf_path = state.config().paths.pdfs_dir.join(&filename);
    if pdf_path.exists() {
        if let Err(e) = std::fs::remove_file(&pdf_path) {
            tracing::warn!("chunks deleted but could not remove {}: {}", pdf_path.display(), e);
        }
    }

    Ok(Json(serde_json::json!({
        "filename": filename,
        "deleted": true,
    })))
}

async fn ingest_upload(state: &AppState, filename: &str, bytes: &[u8]) -> Result<Json<IngestStats>> {
    // Persist the original first so /pdfs links resolve even if indexing
    // partially fails.
    let pdf_path = state.config().paths.pdfs_dir.join(filename);
    tokio::fs::write(&pdf_path, bytes).await?;

    let stats = state.engine().ingest_bytes(filename, bytes).await?;
    Ok(Json(stats))
}

/// Pull the first PDF file field out of a multipart body
async fn read_pdf_field(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Invalid(format!("malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(sanitize_filename) else {
            continue;
        };
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(Error::Invalid(format!(
                "unsupported file type: {} (only PDF)",
                filename
            )));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::Invalid(format!("failed to read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(Error::Invalid("uploaded file is empty".to_string()));
        }
        return Ok((filename, bytes.to_vec()));
    }
    Err(Error::Invalid("no file field in upload".to_string()))
}

/// Keep only the base name so uploads cannot escape the PDF directory
fn sanitize_filename(name: &str) -> String {
    std::path::Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd.pdf"), "passwd.pdf");
        assert_eq!(sanitize_filename("guide.pdf"), "guide.pdf");
        assert_eq!(sanitize_filename("dir/nested/doc.pdf"), "doc.pdf");
    }
}
