use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::{created_response, PaginationParams};
use super::extract::{JsonBody, PathParam, QueryParams};
use crate::{
    errors::ServiceError,
    services::{
        order_status::{CancelOrderRequest, UpdateOrderStatusRequest},
        orders::{
            CheckoutRequest, CheckoutResult, CreateOrderRequest, OrderDetails, OrderListResponse,
        },
    },
    ApiResponse, ApiResult, AppState,
};

pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetails>>), ServiceError> {
    let details = state.services.orders.create_order(payload).await?;
    Ok(created_response(details))
}

/// Prices the cart server-side, then settles it with the computed total.
pub async fn checkout(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResult>>), ServiceError> {
    let result = state.services.orders.checkout(payload).await?;
    Ok(created_response(result))
}

pub async fn get_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<OrderDetails> {
    let details = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(details)))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<UpdateOrderStatusRequest>,
) -> ApiResult<OrderDetails> {
    let details = state
        .services
        .order_status
        .update_order_status(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(details)))
}

/// Cancels and removes the order. The reason may come as a query parameter or a JSON body.
pub async fn delete_order(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    QueryParams(query): QueryParams<CancelOrderRequest>,
    body: Option<JsonBody<CancelOrderRequest>>,
) -> ApiResult<OrderDetails> {
    let reason = body
        .and_then(|JsonBody(b)| b.cancellation_reason)
        .or(query.cancellation_reason)
        .filter(|r| !r.trim().is_empty());
    let details = state.services.order_status.delete_order(id, reason).await?;
    Ok(Json(ApiResponse {
        message: Some("Order cancelled".to_string()),
        ..ApiResponse::success(details)
    }))
}

pub async fn list_user_orders(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<Uuid>,
    QueryParams(params): QueryParams<PaginationParams>,
) -> ApiResult<OrderListResponse> {
    let orders = state
        .services
        .orders
        .list_orders_for_user(user_id, params.page, params.per_page)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}
