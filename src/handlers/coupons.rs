use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::common::created_response;
use super::extract::{JsonBody, PathParam, QueryParams};
use crate::{
    entities::coupon,
    errors::ServiceError,
    services::{
        coupons::{CouponWithUsage, CreateCouponRequest},
        discounts::{CouponValidation, ValidateCouponRequest},
    },
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct CouponListQuery {
    #[serde(default)]
    pub active_only: bool,
}

pub async fn create_coupon(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCouponRequest>,
) -> Result<(StatusCode, Json<ApiResponse<coupon::Model>>), ServiceError> {
    let coupon = state.services.coupons.create_coupon(payload).await?;
    Ok(created_response(coupon))
}

pub async fn list_coupons(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CouponListQuery>,
) -> ApiResult<Vec<coupon::Model>> {
    let coupons = state.services.coupons.list_coupons(query.active_only).await?;
    Ok(Json(ApiResponse::success(coupons)))
}

pub async fn get_coupon(
    State(state): State<AppState>,
    PathParam(code): PathParam<String>,
) -> ApiResult<CouponWithUsage> {
    let coupon = state.services.coupons.get_with_usage(&code).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

pub async fn deactivate_coupon(
    State(state): State<AppState>,
    PathParam(code): PathParam<String>,
) -> ApiResult<coupon::Model> {
    let coupon = state.services.coupons.deactivate(&code).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

pub async fn validate_coupon(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ValidateCouponRequest>,
) -> ApiResult<CouponValidation> {
    let validation = state.services.discounts.validate_coupon(payload).await?;
    Ok(Json(ApiResponse::success(validation)))
}
