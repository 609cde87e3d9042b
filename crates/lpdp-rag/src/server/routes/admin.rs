//! Collection statistics and document upload

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{CollectionStats, FileType};

const STATS_FAILED: &str = "Gagal mengambil statistik";
const NO_FILES: &str = "Tidak ada file yang diupload";
const UPLOAD_FAILED: &str = "Gagal memproses dokumen";

/// Multipart field carrying the uploaded files
pub const UPLOAD_FIELD: &str = "documents";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub count: usize,
}

/// GET /admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<CollectionStats>> {
    let service = state.require_service()?;
    let stats = service.collection_stats().await.map_err(|e| {
        tracing::error!("Collecting stats failed: {}", e);
        Error::internal(STATS_FAILED)
    })?;
    Ok(Json(stats))
}

/// POST /admin/upload
///
/// Files with unsupported extensions are skipped. A file that fails to
/// parse or index is logged and left out of the count.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let service = state.require_service()?;

    let mut received = 0usize;
    let mut count = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        Error::internal(UPLOAD_FAILED)
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        if filename.is_empty() {
            continue;
        }

        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read {}: {}", filename, e);
            Error::internal(UPLOAD_FAILED)
        })?;
        received += 1;

        if !FileType::from_filename(&filename).is_uploadable() {
            tracing::warn!("Skipping unsupported upload: {}", filename);
            continue;
        }

        tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());
        match service.add_document_bytes(&filename, &data).await {
            Ok(_) => count += 1,
            Err(e) => tracing::warn!("Failed to ingest {}: {}", filename, e),
        }
    }

    if received == 0 {
        return Err(Error::invalid_input(NO_FILES));
    }

    Ok(Json(UploadResponse {
        message: format!("{} dokumen berhasil diproses", count),
        count,
    }))
}
