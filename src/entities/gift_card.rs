use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::models::money::from_cents;

/// Canonical lookup form of a gift card code: upper-case, without `-` separators.
pub fn normalize_code(code: &str) -> String {
    code.trim()
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Why a gift card contributed nothing to a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GiftCardRejection {
    NotFound,
    Inactive,
    Exhausted,
    Expired,
    Redeemed,
    NotOwner,
}

impl GiftCardRejection {
    pub fn code(&self) -> &'static str {
        match self {
            GiftCardRejection::NotFound => "not_found",
            GiftCardRejection::Inactive => "inactive",
            GiftCardRejection::Exhausted => "exhausted",
            GiftCardRejection::Expired => "expired",
            GiftCardRejection::Redeemed => "redeemed",
            GiftCardRejection::NotOwner => "not_owner",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            GiftCardRejection::NotFound => "Gift card does not exist",
            GiftCardRejection::Inactive => "Gift card is not active",
            GiftCardRejection::Exhausted => "Gift card has no remaining balance",
            GiftCardRejection::Expired => "Gift card has expired",
            GiftCardRejection::Redeemed => "Gift card has already been redeemed",
            GiftCardRejection::NotOwner => "Gift card belongs to another customer",
        }
    }

    pub fn into_error(self) -> ServiceError {
        let message = self.message().to_string();
        match self {
            GiftCardRejection::NotFound | GiftCardRejection::Inactive => {
                ServiceError::InvalidGiftCard(message)
            }
            GiftCardRejection::Exhausted
            | GiftCardRejection::Expired
            | GiftCardRejection::Redeemed => ServiceError::GiftCardExhaustedOrExpired(message),
            GiftCardRejection::NotOwner => ServiceError::GiftCardNotEligible(message),
        }
    }
}

/// Stored-value card. `current_balance_cents` only grows through explicit top-ups.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gift_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub initial_balance_cents: i64,
    pub current_balance_cents: i64,
    pub currency: String,
    pub bound_user_id: Option<Uuid>,
    pub recipient_email: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_redeemed: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn current_balance(&self) -> Decimal {
        from_cents(self.current_balance_cents)
    }

    pub fn initial_balance(&self) -> Decimal {
        from_cents(self.initial_balance_cents)
    }

    pub fn check_validity(&self, now: DateTime<Utc>) -> Result<(), GiftCardRejection> {
        if self.is_redeemed {
            return Err(GiftCardRejection::Redeemed);
        }
        if self.current_balance_cents <= 0 {
            return Err(GiftCardRejection::Exhausted);
        }
        if matches!(self.expiry_date, Some(expiry) if expiry < now) {
            return Err(GiftCardRejection::Expired);
        }
        Ok(())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.check_validity(now).is_ok()
    }

    /// Unbound cards are usable by anyone; a bound card needs the owner or recipient.
    pub fn usable_by(&self, user_id: Option<Uuid>, email: Option<&str>) -> bool {
        if self.bound_user_id.is_none() && self.recipient_email.is_none() {
            return true;
        }
        let owner_matches = matches!((self.bound_user_id, user_id), (Some(b), Some(u)) if b == u);
        let recipient_matches = match (&self.recipient_email, email) {
            (Some(recipient), Some(email)) => recipient.trim().eq_ignore_ascii_case(email.trim()),
            _ => false,
        };
        owner_matches || recipient_matches
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::gift_card_transaction::Entity")]
    Transactions,
}

impl Related<super::gift_card_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn card(balance_cents: i64) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            code: "ABCD1234".into(),
            initial_balance_cents: balance_cents,
            current_balance_cents: balance_cents,
            currency: "USD".into(),
            bound_user_id: None,
            recipient_email: None,
            expiry_date: None,
            is_redeemed: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn normalizes_codes() {
        assert_eq!(normalize_code(" abcd-1234-efgh "), "ABCD1234EFGH");
        assert_eq!(normalize_code("ABCD1234EFGH"), "ABCD1234EFGH");
    }

    #[test]
    fn validity_requires_balance_and_unexpired() {
        let now = Utc::now();
        let mut c = card(3000);
        assert!(c.is_valid_at(now));

        c.current_balance_cents = 0;
        assert_eq!(c.check_validity(now), Err(GiftCardRejection::Exhausted));

        c.current_balance_cents = 100;
        c.expiry_date = Some(now - Duration::days(1));
        assert_eq!(c.check_validity(now), Err(GiftCardRejection::Expired));

        c.expiry_date = None;
        c.is_redeemed = true;
        assert_eq!(c.check_validity(now), Err(GiftCardRejection::Redeemed));
    }

    #[test]
    fn binding_rules() {
        let owner = Uuid::new_v4();
        let mut c = card(1000);
        assert!(c.usable_by(None, None));

        c.bound_user_id = Some(owner);
        assert!(c.usable_by(Some(owner), None));
        assert!(!c.usable_by(Some(Uuid::new_v4()), None));
        assert!(!c.usable_by(None, Some("someone@example.com")));

        c.recipient_email = Some("Friend@Example.com".into());
        assert!(c.usable_by(None, Some("friend@example.com")));
    }
}
