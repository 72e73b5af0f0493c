use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ServiceError;

/// Canonical delivery lifecycle of an order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Received")]
    #[strum(serialize = "Received")]
    Received,
    #[sea_orm(string_value = "Processing")]
    #[strum(serialize = "Processing")]
    Processing,
    #[sea_orm(string_value = "Shipped")]
    #[strum(serialize = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Out for Delivery")]
    #[serde(rename = "Out for Delivery")]
    #[strum(serialize = "Out for Delivery")]
    OutForDelivery,
    #[sea_orm(string_value = "Delivered")]
    #[strum(serialize = "Delivered")]
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Received,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Delivered
    }

    /// Admin-driven moves may skip or revisit states; only leaving `Delivered` is refused.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        !self.is_terminal() || next == self
    }
}

impl FromStr for OrderStatus {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.to_string().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ServiceError::InvalidStatusValue(format!(
                    "'{}' is not one of Received, Processing, Shipped, Out for Delivery, Delivered",
                    value
                ))
            })
    }
}

/// Status vocabulary used by older clients. Never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum LegacyOrderStatus {
    Pending,
    Confirm,
    Delivered,
}

impl LegacyOrderStatus {
    pub fn canonical(self) -> OrderStatus {
        match self {
            LegacyOrderStatus::Pending => OrderStatus::Received,
            LegacyOrderStatus::Confirm => OrderStatus::Processing,
            LegacyOrderStatus::Delivered => OrderStatus::Delivered,
        }
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        value.trim().parse().map_err(|_| {
            ServiceError::InvalidStatusValue(format!(
                "'{}' is not one of pending, confirm, delivered",
                value
            ))
        })
    }
}

/// Resolves the status a caller asked for. The canonical field wins when both are given.
pub fn resolve_requested_status(
    status: Option<&str>,
    legacy_status: Option<&str>,
) -> Result<Option<OrderStatus>, ServiceError> {
    if let Some(raw) = status.filter(|s| !s.trim().is_empty()) {
        return raw.parse().map(Some);
    }
    match legacy_status.filter(|s| !s.trim().is_empty()) {
        Some(raw) => Ok(Some(LegacyOrderStatus::parse(raw)?.canonical())),
        None => Ok(None),
    }
}

/// Payment status as reported by the payment collaborator. Only `FAILED` matters here.
pub fn is_failed_payment(payment_status: &str) -> bool {
    payment_status.trim().eq_ignore_ascii_case("failed")
}
