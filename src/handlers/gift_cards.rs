use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::common::created_response;
use super::extract::{JsonBody, PathParam};
use crate::{
    entities::gift_card_transaction,
    errors::ServiceError,
    services::gift_cards::{GiftCardBalance, IssueGiftCardRequest, TopUpRequest},
    ApiResponse, ApiResult, AppState,
};

pub async fn issue_gift_card(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<IssueGiftCardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GiftCardBalance>>), ServiceError> {
    let card = state.services.gift_cards.issue(payload).await?;
    Ok(created_response(GiftCardBalance::from(&card)))
}

pub async fn get_balance(
    State(state): State<AppState>,
    PathParam(code): PathParam<String>,
) -> ApiResult<GiftCardBalance> {
    let balance = state.services.gift_cards.get_balance(&code).await?;
    Ok(Json(ApiResponse::success(balance)))
}

pub async fn top_up(
    State(state): State<AppState>,
    PathParam(code): PathParam<String>,
    JsonBody(payload): JsonBody<TopUpRequest>,
) -> ApiResult<GiftCardBalance> {
    state.services.gift_cards.top_up(&code, payload.amount).await?;
    let balance = state.services.gift_cards.get_balance(&code).await?;
    Ok(Json(ApiResponse::success(balance)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    PathParam(code): PathParam<String>,
) -> ApiResult<Vec<gift_card_transaction::Model>> {
    let ledger = state.services.gift_cards.transactions(&code).await?;
    Ok(Json(ApiResponse::success(ledger)))
}
