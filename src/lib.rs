//! Storefront API Library
//!
//! Discount resolution, order settlement and the order lifecycle for a storefront,
//! exposed over HTTP under `/api/v1`.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod migrator;
pub mod models;
pub mod notifications;
pub mod services;
pub mod tracing;

use std::{sync::Arc, time::Duration};

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::{
    config::AppConfig, events::EventSender, notifications::NotificationDispatcher,
    services::factory::{ServiceContainer, ServiceFactory},
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub event_sender: EventSender,
    pub notifier: NotificationDispatcher,
    pub services: ServiceContainer,
}

impl AppState {
    /// Wires every service over the shared connection and channels.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        event_sender: EventSender,
        notifier: NotificationDispatcher,
    ) -> Self {
        let factory = ServiceFactory::new(
            db.clone(),
            event_sender.clone(),
            notifier.clone(),
            config.clone(),
        );
        let services = ServiceContainer::new(&factory);
        Self {
            db,
            config,
            event_sender,
            notifier,
            services,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!response.success);
    }

    #[test]
    fn success_envelope_omits_empty_fields() {
        let value = serde_json::to_value(ApiResponse::success(1)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], 1);
        assert!(value.get("message").is_none());
        assert!(value.get("errors").is_none());
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    let orders = Router::new()
        .route("/orders", post(handlers::orders::create_order))
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route("/checkout", post(handlers::orders::checkout))
        .route("/users/:id/orders", get(handlers::orders::list_user_orders));

    let discounts = Router::new()
        .route(
            "/discounts/calculate",
            post(handlers::discounts::calculate_discounts),
        )
        .route(
            "/coupons",
            post(handlers::coupons::create_coupon).get(handlers::coupons::list_coupons),
        )
        .route("/coupons/validate", post(handlers::coupons::validate_coupon))
        .route("/coupons/:code", get(handlers::coupons::get_coupon))
        .route(
            "/coupons/:code/deactivate",
            post(handlers::coupons::deactivate_coupon),
        )
        .route("/gift-cards", post(handlers::gift_cards::issue_gift_card))
        .route("/gift-cards/:code", get(handlers::gift_cards::get_balance))
        .route("/gift-cards/:code/top-up", post(handlers::gift_cards::top_up))
        .route(
            "/gift-cards/:code/transactions",
            get(handlers::gift_cards::list_transactions),
        );

    let catalog = Router::new()
        .route("/products", post(handlers::products::create_product))
        .route("/products/:id", get(handlers::products::get_product))
        .route(
            "/products/:id/variations",
            post(handlers::products::add_variation),
        );

    Router::new().merge(orders).merge(discounts).merge(catalog)
}

/// The full application: API routes, health checks, metrics and the HTTP middleware stack.
pub fn build_router(state: AppState) -> Router {
    let cors_layer = if state.config.is_development() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::<AppState>::new()
        .route("/", get(|| async { "storefront-api up" }))
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/health", handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .layer(crate::tracing::http_trace_layer())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .layer(axum::middleware::from_fn(
            crate::tracing::request_id_middleware,
        ))
        .with_state(state)
}
