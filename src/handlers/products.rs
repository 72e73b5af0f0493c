use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::created_response;
use super::extract::{JsonBody, PathParam};
use crate::{
    entities::{product, product_variation},
    errors::ServiceError,
    services::catalog::{CreateProductRequest, CreateVariationRequest, ProductWithVariations},
    ApiResponse, ApiResult, AppState,
};

pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ServiceError> {
    let product = state.services.catalog.create_product(payload).await?;
    Ok(created_response(product))
}

pub async fn get_product(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<ProductWithVariations> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn add_variation(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<CreateVariationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<product_variation::Model>>), ServiceError> {
    let variation = state.services.catalog.add_variation(id, payload).await?;
    Ok(created_response(variation))
}
