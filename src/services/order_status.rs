use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        in_app_notification,
        order::{ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
        order_item, order_status_history,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::{ORDERS_CANCELLED, STATUS_UPDATES},
    models::status::{is_failed_payment, resolve_requested_status},
    notifications::{NotificationDispatcher, OrderNotification, OrderSummary},
    services::{
        inventory::InventoryService,
        orders::{customer_contact, load_details, stock_line, CustomerContact, OrderDetails},
    },
};

/// Actor recorded when the caller does not name one.
pub const DEFAULT_ACTOR: &str = "admin";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
    /// Older clients send `pending` / `confirm` / `delivered` here.
    #[serde(alias = "order_status")]
    pub order_status: Option<String>,
    #[validate(length(max = 128))]
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 128))]
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub cancellation_reason: Option<String>,
}

/// Drives orders through their delivery lifecycle and cancels them.
#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
    notifier: NotificationDispatcher,
    inventory: InventoryService,
}

impl OrderStatusService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Option<Arc<EventSender>>,
        notifier: NotificationDispatcher,
        inventory: InventoryService,
    ) -> Self {
        Self {
            db,
            event_sender,
            notifier,
            inventory,
        }
    }

    /// Writes a status and/or shipping details. Every status write appends to the
    /// history and notifies the customer, even when the status is unchanged.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        let new_status =
            resolve_requested_status(request.status.as_deref(), request.order_status.as_deref())?;
        let tracking_number = request
            .tracking_number
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if new_status.is_none() && tracking_number.is_none() && request.estimated_delivery.is_none() {
            return Err(ServiceError::InvalidInput(
                "nothing to update: supply status, orderStatus, trackingNumber or estimatedDelivery"
                    .to_string(),
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!("Failed to fetch order {}: {}", order_id, e);
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::OrderNotFound(order_id.to_string()))?;
        let old_status = order.status;

        if let Some(next) = new_status {
            if !old_status.can_transition_to(next) {
                return Err(ServiceError::InvalidStatusValue(format!(
                    "order is {} and cannot move to {}",
                    old_status, next
                )));
            }
        }

        let now = Utc::now();
        let user_id = order.user_id;
        let mut active: OrderActiveModel = order.into();
        if let Some(next) = new_status {
            active.status = Set(next);
        }
        if tracking_number.is_some() {
            active.tracking_number = Set(tracking_number);
        }
        if let Some(eta) = request.estimated_delivery {
            active.estimated_delivery = Set(Some(eta));
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await.map_err(|e| {
            error!("Failed to update order {}: {}", order_id, e);
            ServiceError::DatabaseError(e)
        })?;

        if let Some(next) = new_status {
            let position = order_status_history::Entity::find()
                .filter(order_status_history::Column::OrderId.eq(order_id))
                .order_by_desc(order_status_history::Column::Position)
                .one(&txn)
                .await?
                .map_or(0, |last| last.position + 1);

            order_status_history::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                position: Set(position),
                status: Set(next),
                updated_by: Set(request
                    .updated_by
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ACTOR.to_string())),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            if let Some(user_id) = user_id {
                in_app_notification::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    order_id: Set(order_id),
                    title: Set(format!("Order {} updated", updated.order_number)),
                    message: Set(format!("Your order is now {}.", next)),
                    is_read: Set(false),
                    created_at: Set(now),
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let details = load_details(db, updated).await?;

        if let Some(next) = new_status {
            STATUS_UPDATES.with_label_values(&[&next.to_string()]).inc();
            info!(order_id = %order_id, old_status = %old_status, new_status = %next, "Order status updated");
            self.publish(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status: next,
            });

            if let Some(contact) = self.contact(&details.order).await {
                let summary = OrderSummary::new(&details.order, &details.items, contact.name);
                self.notifier.dispatch(OrderNotification::StatusUpdate {
                    to: contact.email,
                    order: summary,
                });
            }
        } else {
            info!(order_id = %order_id, "Order shipping details updated");
        }

        Ok(details)
    }

    /// Cancels an order: restores inventory, sends the cancellation notice and deletes
    /// the order with its lines and history. Returns the order as it was.
    #[instrument(skip(self, reason), fields(order_id = %order_id))]
    pub async fn delete_order(
        &self,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<OrderDetails, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound(order_id.to_string()))?;
        let details = load_details(&txn, order.clone()).await?;

        if is_failed_payment(&order.payment_status) {
            info!(order_id = %order_id, "Payment had failed; no inventory to restore");
        } else {
            for item in &details.items {
                self.inventory.restore(&txn, &stock_line(item)).await?;
            }
        }

        order_item::Entity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        order_status_history::Entity::delete_many()
            .filter(order_status_history::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        order.delete(&txn).await.map_err(|e| {
            error!("Failed to delete order {}: {}", order_id, e);
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        ORDERS_CANCELLED.inc();
        info!(order_id = %order_id, reason = ?reason, "Order cancelled");

        if let Some(contact) = self.contact(&details.order).await {
            let summary = OrderSummary::new(&details.order, &details.items, contact.name);
            self.notifier.dispatch(OrderNotification::Cancellation {
                to: contact.email,
                reason: reason.clone(),
                order: summary,
            });
        }
        self.publish(Event::OrderCancelled { order_id, reason });

        Ok(details)
    }

    async fn contact(&self, order: &OrderModel) -> Option<CustomerContact> {
        match customer_contact(&*self.db, order).await {
            Ok(Some(contact)) => Some(contact),
            Ok(None) => {
                warn!(order_id = %order.id, "No customer email on file; notification skipped");
                None
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Could not resolve customer email");
                None
            }
        }
    }

    fn publish(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            event_sender.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_field_accepts_both_spellings() {
        let camel: UpdateOrderStatusRequest =
            serde_json::from_value(serde_json::json!({"orderStatus": "confirm"})).unwrap();
        let snake: UpdateOrderStatusRequest =
            serde_json::from_value(serde_json::json!({"order_status": "confirm"})).unwrap();
        assert_eq!(camel.order_status.as_deref(), Some("confirm"));
        assert_eq!(snake.order_status.as_deref(), Some("confirm"));
    }

    #[test]
    fn updated_by_must_not_be_blank() {
        let request = UpdateOrderStatusRequest {
            status: Some("Shipped".into()),
            updated_by: Some(String::new()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
