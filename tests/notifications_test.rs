//! Mail relay delivery through a mocked HTTP endpoint.

use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::{
    models::OrderStatus,
    notifications::{
        run_notification_worker, templates, EmailMessage, HttpRelaySender, NotificationDispatcher,
        NotificationSender, OrderNotification, OrderSummary,
    },
};
use uuid::Uuid;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn summary(status: OrderStatus) -> OrderSummary {
    OrderSummary {
        order_id: Uuid::new_v4(),
        order_number: "ORD-20260101-ABCD1234".into(),
        customer_name: Some("Grace Hopper".into()),
        status,
        currency: "USD".into(),
        shipping: dec!(4.99),
        discount: dec!(0),
        total: dec!(24.99),
        tracking_number: Some("1Z999".into()),
        estimated_delivery: None,
        lines: vec![],
    }
}

fn message() -> EmailMessage {
    templates::render(&OrderNotification::StatusUpdate {
        to: "grace@example.com".into(),
        order: summary(OrderStatus::Shipped),
    })
}

#[tokio::test]
async fn relay_success_reports_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_partial_json(json!({"to": ["grace@example.com"]})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"messageId": "relay-7"})))
        .expect(1)
        .mount(&server)
        .await;

    let sender = HttpRelaySender::new(format!("{}/send", server.uri()));
    let result = sender.send(message()).await;

    assert!(result.success);
    assert_eq!(result.message_id.as_deref(), Some("relay-7"));
}

#[tokio::test]
async fn relay_without_a_body_still_counts_as_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = HttpRelaySender::new(server.uri()).send(message()).await;
    assert!(result.success);
    assert!(result.message_id.is_none());
}

#[tokio::test]
async fn relay_errors_become_failed_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = HttpRelaySender::new(server.uri()).send(message()).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("503"));
}

#[tokio::test]
async fn worker_pushes_queued_notifications_to_the_relay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "m"})))
        .expect(2)
        .mount(&server)
        .await;

    let sender: Arc<dyn NotificationSender> =
        Arc::new(HttpRelaySender::new(format!("{}/mail", server.uri())));
    let (dispatcher, rx) = NotificationDispatcher::channel(4);
    dispatcher.dispatch(OrderNotification::Confirmation {
        to: "grace@example.com".into(),
        order: summary(OrderStatus::Received),
    });
    dispatcher.dispatch(OrderNotification::Cancellation {
        to: "grace@example.com".into(),
        reason: Some("duplicate".into()),
        order: summary(OrderStatus::Received),
    });
    drop(dispatcher);

    run_notification_worker(rx, sender).await;
    // MockServer verifies the expected call count on drop.
}
