//! Business counters exported in the Prometheus text format at `/metrics`.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ORDERS_CREATED: IntCounter =
        IntCounter::new("orders_created_total", "Total number of orders settled")
            .expect("metric can be created");
    pub static ref FAILED_PAYMENT_ORDERS: IntCounter = IntCounter::new(
        "orders_failed_payment_total",
        "Orders recorded with a failed payment and no inventory effect"
    )
    .expect("metric can be created");
    pub static ref ORDERS_CANCELLED: IntCounter =
        IntCounter::new("orders_cancelled_total", "Total number of cancelled orders")
            .expect("metric can be created");
    pub static ref STATUS_UPDATES: IntCounterVec = IntCounterVec::new(
        Opts::new("order_status_updates_total", "Order status writes by target status"),
        &["status"]
    )
    .expect("metric can be created");
    pub static ref DISCOUNT_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("discount_rejections_total", "Coupon and gift card rejections by reason"),
        &["kind"]
    )
    .expect("metric can be created");
    pub static ref STOCK_DEPLETIONS: IntCounter = IntCounter::new(
        "stock_depletions_total",
        "Products or variations that reached zero stock"
    )
    .expect("metric can be created");
    pub static ref NOTIFICATION_FAILURES: IntCounter = IntCounter::new(
        "notification_failures_total",
        "Notifications that could not be queued or delivered"
    )
    .expect("metric can be created");
}

/// Registers every collector with the shared registry. Safe to call more than once.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ORDERS_CREATED.clone()),
        Box::new(FAILED_PAYMENT_ORDERS.clone()),
        Box::new(ORDERS_CANCELLED.clone()),
        Box::new(STATUS_UPDATES.clone()),
        Box::new(DISCOUNT_REJECTIONS.clone()),
        Box::new(STOCK_DEPLETIONS.clone()),
        Box::new(NOTIFICATION_FAILURES.clone()),
    ];
    for collector in collectors {
        // AlreadyReg is expected on repeated calls (tests build several routers).
        let _ = REGISTRY.register(collector);
    }
}

pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub async fn metrics_handler() -> impl IntoResponse {
    match render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_output_lists_registered_counters() {
        register_metrics();
        ORDERS_CREATED.inc();
        DISCOUNT_REJECTIONS.with_label_values(&["coupon_min_amount"]).inc();

        let text = render().unwrap();
        assert!(text.contains("orders_created_total"));
        assert!(text.contains("discount_rejections_total{kind=\"coupon_min_amount\"}"));
    }
}
