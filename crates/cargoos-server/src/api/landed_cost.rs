use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use cargoos_fx::{quote_landed_cost, LandedCostError, LandedCostInput, LandedCostResult};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

fn map_landed_cost_error(request_id: String, error: &LandedCostError) -> ApiError {
    match error {
        LandedCostError::Fx(fx) if fx.is_upstream() => {
            tracing::warn!(error = %fx, "FX rate unavailable");
            ApiError::new(request_id, "upstream_error", error.to_string())
        }
        LandedCostError::InvalidInput { .. } | LandedCostError::Fx(_) => {
            ApiError::validation(request_id, error)
        }
    }
}

pub(super) async fn quote(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<LandedCostInput>, JsonRejection>,
) -> Result<Json<ApiResponse<LandedCostResult>>, ApiError> {
    let Json(input) = body.map_err(|e| ApiError::validation(req_id.0.clone(), &e))?;
    let result = quote_landed_cost(&state.fx, &input, &state.config.fx_target_currency)
        .await
        .map_err(|e| map_landed_cost_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(result, req_id.0)))
}
