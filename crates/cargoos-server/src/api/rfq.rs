use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use cargoos_core::{RfqDocument, RfqError, RfqRequest};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

pub(super) async fn create_rfq(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<RfqRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RfqDocument>>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::validation(req_id.0.clone(), &e))?;

    let document = cargoos_core::generate_rfq(&request, &state.config.exports_dir).map_err(|e| match e {
        RfqError::Io { .. } => ApiError::internal(req_id.0.clone(), &e),
        RfqError::EmptyTitle | RfqError::UnsupportedLanguage(_) => {
            ApiError::validation(req_id.0.clone(), &e)
        }
    })?;

    Ok(Json(ApiResponse::new(document, req_id.0)))
}
