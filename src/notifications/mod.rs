//! Outbound customer and operator email.
//!
//! Services hand an [`OrderNotification`] to the [`NotificationDispatcher`], which
//! queues it without waiting. A background worker renders each message and passes it
//! to the configured [`NotificationSender`]. Delivery problems are logged and counted,
//! never returned to the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::entities::{order, order_item};
use crate::metrics::NOTIFICATION_FAILURES;
use crate::models::{money::from_cents, OrderStatus};

pub mod templates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResult {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Delivery backend for rendered email.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> SendResult;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, message: EmailMessage) -> SendResult {
        info!(to = ?message.to, subject = %message.subject, "email (log only)");
        SendResult::delivered(Some(format!("log-{}", Uuid::new_v4())))
    }
}

/// POSTs each message as JSON to a mail relay.
#[derive(Debug, Clone)]
pub struct HttpRelaySender {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    #[serde(default, alias = "message_id")]
    message_id: Option<String>,
}

impl HttpRelaySender {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for HttpRelaySender {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> SendResult {
        let response = match self.client.post(&self.endpoint).json(&message).send().await {
            Ok(response) => response,
            Err(e) => return SendResult::failed(format!("relay unreachable: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return SendResult::failed(format!("relay responded with {}", status));
        }

        let message_id = response
            .json::<RelayResponse>()
            .await
            .ok()
            .and_then(|body| body.message_id);
        SendResult::delivered(message_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSummary {
    pub product_id: Uuid,
    pub variation_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Order facts a message needs, captured before the order may be deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub currency: String,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub lines: Vec<LineSummary>,
}

impl OrderSummary {
    pub fn new(
        order: &order::Model,
        items: &[order_item::Model],
        customer_name: Option<String>,
    ) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_name,
            status: order.status,
            currency: order.currency.clone(),
            shipping: from_cents(order.shipping_cents),
            discount: from_cents(order.discount_cents),
            total: from_cents(order.total_cents),
            tracking_number: order.tracking_number.clone(),
            estimated_delivery: order.estimated_delivery,
            lines: items
                .iter()
                .map(|item| LineSummary {
                    product_id: item.product_id,
                    variation_id: item.variation_id,
                    quantity: item.quantity,
                    unit_price: from_cents(item.unit_price_cents),
                    subtotal: from_cents(item.subtotal_cents),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderNotification {
    Confirmation {
        to: String,
        order: OrderSummary,
    },
    AdminNewOrder {
        to: String,
        customer_email: Option<String>,
        shipping_address: Option<serde_json::Value>,
        order: OrderSummary,
    },
    StatusUpdate {
        to: String,
        order: OrderSummary,
    },
    Cancellation {
        to: String,
        reason: Option<String>,
        order: OrderSummary,
    },
}

impl OrderNotification {
    pub fn recipient(&self) -> &str {
        match self {
            OrderNotification::Confirmation { to, .. }
            | OrderNotification::AdminNewOrder { to, .. }
            | OrderNotification::StatusUpdate { to, .. }
            | OrderNotification::Cancellation { to, .. } => to,
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            OrderNotification::Confirmation { order, .. }
            | OrderNotification::AdminNewOrder { order, .. }
            | OrderNotification::StatusUpdate { order, .. }
            | OrderNotification::Cancellation { order, .. } => order.order_id,
        }
    }
}

/// Non-blocking hand-off point for notifications.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<OrderNotification>,
}

impl NotificationDispatcher {
    pub fn new(tx: mpsc::Sender<OrderNotification>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OrderNotification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Queues a notification. A full or closed queue is logged and counted.
    pub fn dispatch(&self, notification: OrderNotification) {
        let order_id = notification.order_id();
        if let Err(e) = self.tx.try_send(notification) {
            NOTIFICATION_FAILURES.inc();
            warn!(order_id = %order_id, error = %e, "Notification dropped before delivery");
        }
    }
}

/// Renders and delivers queued notifications until every dispatcher is dropped.
pub async fn run_notification_worker(
    mut rx: mpsc::Receiver<OrderNotification>,
    sender: Arc<dyn NotificationSender>,
) {
    info!("Starting notification worker");
    while let Some(notification) = rx.recv().await {
        let order_id = notification.order_id();
        let message = templates::render(&notification);
        let result = sender.send(message).await;
        if result.success {
            debug!(order_id = %order_id, message_id = ?result.message_id, "notification sent");
        } else {
            NOTIFICATION_FAILURES.inc();
            error!(
                order_id = %order_id,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Notification delivery failed"
            );
        }
    }
    info!("Notification worker stopped");
}
