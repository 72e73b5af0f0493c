use axum::{extract::State, Json};

use super::extract::JsonBody;
use crate::{
    services::discounts::{CalculateDiscountsRequest, DiscountBreakdown},
    ApiResponse, ApiResult, AppState,
};

/// Prices a cart without settling it. Rejected codes come back inside the breakdown.
pub async fn calculate_discounts(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CalculateDiscountsRequest>,
) -> ApiResult<DiscountBreakdown> {
    let breakdown = state.services.discounts.calculate_discounts(&payload).await?;
    Ok(Json(ApiResponse::success(breakdown)))
}
