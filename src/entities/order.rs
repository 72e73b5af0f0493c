use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{money::from_cents, CustomerIdentity, GuestCustomer, OrderStatus};

/// Settled order. Totals are fixed at creation; only status fields change afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    /// Set for registered customers; exclusive with `guest_customer`
    pub user_id: Option<Uuid>,
    #[sea_orm(column_type = "Json", nullable)]
    pub guest_customer: Option<Json>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub payment_id: Option<String>,
    pub payment_status: String,
    pub delivery_address_id: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub shipping_address: Option<Json>,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub coupon_code: Option<String>,
    pub gift_card_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn total(&self) -> Decimal {
        from_cents(self.total_cents)
    }

    pub fn shipping(&self) -> Decimal {
        from_cents(self.shipping_cents)
    }

    pub fn guest(&self) -> Option<GuestCustomer> {
        let value = self.guest_customer.clone()?;
        match serde_json::from_value(value) {
            Ok(guest) => Some(guest),
            Err(e) => {
                warn!(order_id = %self.id, error = %e, "Stored guest snapshot is unreadable");
                None
            }
        }
    }

    pub fn identity(&self) -> Option<CustomerIdentity> {
        match self.user_id {
            Some(user_id) => Some(CustomerIdentity::Registered { user_id }),
            None => self.guest().map(CustomerIdentity::Guest),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
    #[sea_orm(has_many = "super::order_status_history::Entity")]
    StatusHistory,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::order_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
