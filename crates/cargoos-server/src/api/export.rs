use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use cargoos_core::{ExportError, ExportFormat, SupplierRecord};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ExportData {
    path: String,
    format: String,
    count: usize,
}

pub(super) async fn export_records(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(fmt): Path<String>,
    body: Result<Json<Vec<SupplierRecord>>, JsonRejection>,
) -> Result<Json<ApiResponse<ExportData>>, ApiError> {
    let format: ExportFormat = fmt
        .parse()
        .map_err(|e: ExportError| ApiError::validation(req_id.0.clone(), &e))?;
    let Json(records) = body.map_err(|e| ApiError::validation(req_id.0.clone(), &e))?;

    let count = records.len();
    let dir = state.config.exports_dir.clone();
    let path = tokio::task::spawn_blocking(move || {
        cargoos_core::export_records(&records, format, &dir)
    })
    .await
    .map_err(|e| ApiError::internal(req_id.0.clone(), &e))?
    .map_err(|e| ApiError::internal(req_id.0.clone(), &e))?;
    tracing::info!(path = %path.display(), format = %format, count, "exported records");

    Ok(Json(ApiResponse::new(
        ExportData {
            path: path.display().to_string(),
            format: format.to_string(),
            count,
        },
        req_id.0,
    )))
}
