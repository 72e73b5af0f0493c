use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::OrderStatus;

/// Domain events published after a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        total_cents: i64,
        payment_failed: bool,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderCancelled {
        order_id: Uuid,
        reason: Option<String>,
    },
    StockDepleted {
        product_id: Uuid,
        variation_id: Option<Uuid>,
    },
    CouponRedeemed {
        coupon_id: Uuid,
        order_id: Uuid,
        discount_cents: i64,
    },
    GiftCardRedeemed {
        gift_card_id: Uuid,
        order_id: Uuid,
        amount_cents: i64,
        balance_after_cents: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Publishes without awaiting capacity. Losing an event never fails the caller.
    pub fn publish(&self, event: Event) {
        if let Err(e) = self.sender.try_send(event) {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

/// Drains the event channel, logging each event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                total_cents,
                payment_failed,
            } => {
                info!(order_id = %order_id, total_cents, payment_failed, "order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id = %order_id, %old_status, %new_status, "order status changed");
            }
            Event::OrderCancelled { order_id, reason } => {
                info!(order_id = %order_id, reason = ?reason, "order cancelled");
            }
            Event::StockDepleted {
                product_id,
                variation_id,
            } => {
                warn!(product_id = %product_id, variation_id = ?variation_id, "stock depleted");
            }
            Event::CouponRedeemed {
                coupon_id,
                order_id,
                discount_cents,
            } => {
                info!(coupon_id = %coupon_id, order_id = %order_id, discount_cents, "coupon redeemed");
            }
            Event::GiftCardRedeemed {
                gift_card_id,
                order_id,
                amount_cents,
                balance_after_cents,
            } => {
                info!(
                    gift_card_id = %gift_card_id,
                    order_id = %order_id,
                    amount_cents,
                    balance_after_cents,
                    "gift card redeemed"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_never_blocks_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        let order_id = Uuid::new_v4();

        sender.publish(Event::OrderCancelled {
            order_id,
            reason: None,
        });
        // Channel is full; this one is dropped instead of awaited.
        sender.publish(Event::OrderCancelled {
            order_id,
            reason: Some("dup".into()),
        });

        assert_eq!(
            rx.recv().await,
            Some(Event::OrderCancelled {
                order_id,
                reason: None
            })
        );
        assert!(rx.try_recv().is_err());
    }
}
