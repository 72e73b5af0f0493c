use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::models::{
    cart::total_quantity,
    money::{from_cents, round_money},
    CartLine,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed_cart")]
    FixedCart,
    #[sea_orm(string_value = "fixed_product")]
    FixedProduct,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum CouponScope {
    #[default]
    #[sea_orm(string_value = "GLOBAL")]
    Global,
    #[sea_orm(string_value = "VENDOR")]
    Vendor,
}

/// Why a coupon contributed nothing to a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CouponRejection {
    NotFound,
    Inactive,
    NotStarted,
    Expired,
    UsageLimitReached,
    PerUserLimitReached,
    EmailNotAllowed,
    MinimumNotMet { minimum: Decimal },
    NoApplicableItems,
}

impl CouponRejection {
    pub fn code(&self) -> &'static str {
        match self {
            CouponRejection::NotFound => "not_found",
            CouponRejection::Inactive => "inactive",
            CouponRejection::NotStarted => "not_started",
            CouponRejection::Expired => "expired",
            CouponRejection::UsageLimitReached => "usage_limit_reached",
            CouponRejection::PerUserLimitReached => "per_user_limit_reached",
            CouponRejection::EmailNotAllowed => "email_not_allowed",
            CouponRejection::MinimumNotMet { .. } => "minimum_not_met",
            CouponRejection::NoApplicableItems => "no_applicable_items",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CouponRejection::NotFound => "Coupon code does not exist".to_string(),
            CouponRejection::Inactive => "Coupon is not active".to_string(),
            CouponRejection::NotStarted => "Coupon is not valid yet".to_string(),
            CouponRejection::Expired => "Coupon has expired".to_string(),
            CouponRejection::UsageLimitReached => {
                "Coupon usage limit has been reached".to_string()
            }
            CouponRejection::PerUserLimitReached => {
                "You have already used this coupon the maximum number of times".to_string()
            }
            CouponRejection::EmailNotAllowed => {
                "Coupon is not available for this email address".to_string()
            }
            CouponRejection::MinimumNotMet { minimum } => {
                format!("Minimum purchase of {} required for this coupon", minimum)
            }
            CouponRejection::NoApplicableItems => {
                "Coupon does not apply to any item in the cart".to_string()
            }
        }
    }

    pub fn into_error(self, code: &str) -> ServiceError {
        let message = format!("{}: {}", code, self.message());
        match self {
            CouponRejection::NotFound | CouponRejection::Inactive => {
                ServiceError::InvalidCoupon(message)
            }
            CouponRejection::NotStarted
            | CouponRejection::Expired
            | CouponRejection::UsageLimitReached => ServiceError::CouponExpiredOrExhausted(message),
            CouponRejection::PerUserLimitReached
            | CouponRejection::EmailNotAllowed
            | CouponRejection::MinimumNotMet { .. }
            | CouponRejection::NoApplicableItems => ServiceError::CouponNotEligible(message),
        }
    }
}

/// Coupon definition. `usage_count` always equals the number of `coupon_usages` rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Upper-case, unique
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// Hundredths: cents for fixed types, hundredths of a percent for `percentage`
    pub discount_amount_hundredths: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub usage_limit_per_user: Option<i32>,
    pub usage_count: i32,
    #[sea_orm(column_type = "Json")]
    pub product_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub excluded_product_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub category_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub excluded_category_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub allowed_emails: Json,
    #[sea_orm(column_type = "Json")]
    pub excluded_emails: Json,
    pub individual_use: bool,
    pub exclude_sale_items: bool,
    pub free_shipping: bool,
    pub minimum_amount_cents: Option<i64>,
    pub maximum_amount_cents: Option<i64>,
    pub vendor_id: Option<Uuid>,
    pub scope: CouponScope,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn discount_amount(&self) -> Decimal {
        from_cents(self.discount_amount_hundredths)
    }

    pub fn minimum_amount(&self) -> Option<Decimal> {
        self.minimum_amount_cents.map(from_cents)
    }

    pub fn maximum_amount(&self) -> Option<Decimal> {
        self.maximum_amount_cents.map(from_cents)
    }

    /// Date window and global usage cap.
    pub fn check_validity(&self, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if self.start_date > now {
            return Err(CouponRejection::NotStarted);
        }
        if matches!(self.end_date, Some(end) if end < now) {
            return Err(CouponRejection::Expired);
        }
        if matches!(self.usage_limit, Some(limit) if self.usage_count >= limit) {
            return Err(CouponRejection::UsageLimitReached);
        }
        Ok(())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.check_validity(now).is_ok()
    }

    pub fn per_user_limit_reached(&self, times_used: u64) -> bool {
        matches!(self.usage_limit_per_user, Some(limit) if times_used >= limit.max(0) as u64)
    }

    /// Allow list (when non-empty) must contain the email; deny list must not.
    pub fn email_allowed(&self, email: Option<&str>) -> bool {
        let email = email.map(|e| e.trim().to_lowercase());
        let allowed = lowercase(super::string_list(&self.allowed_emails));
        let excluded = lowercase(super::string_list(&self.excluded_emails));

        if !allowed.is_empty() {
            match &email {
                Some(e) if allowed.contains(e) => {}
                _ => return false,
            }
        }
        !matches!(&email, Some(e) if excluded.contains(e))
    }

    pub fn restricts_items(&self) -> bool {
        self.exclude_sale_items
            || self.scope == CouponScope::Vendor
            || [
                &self.product_ids,
                &self.excluded_product_ids,
                &self.category_ids,
                &self.excluded_category_ids,
            ]
            .iter()
            .any(|list| !super::uuid_list(list).is_empty())
    }

    pub fn applies_to(&self, line: &CartLine) -> bool {
        let product_ids = super::uuid_list(&self.product_ids);
        let category_ids = super::uuid_list(&self.category_ids);
        let matches_product = |ids: &[Uuid]| {
            ids.contains(&line.product_id)
                || line.variation_id.map_or(false, |v| ids.contains(&v))
        };
        let matches_category = |ids: &[Uuid]| line.category_ids.iter().any(|c| ids.contains(c));

        if (!product_ids.is_empty() || !category_ids.is_empty())
            && !(matches_product(&product_ids) || matches_category(&category_ids))
        {
            return false;
        }
        if matches_product(&super::uuid_list(&self.excluded_product_ids))
            || matches_category(&super::uuid_list(&self.excluded_category_ids))
        {
            return false;
        }
        if self.exclude_sale_items && line.on_sale {
            return false;
        }
        if self.scope == CouponScope::Vendor && line.vendor_id != self.vendor_id {
            return false;
        }
        true
    }

    /// Amount the coupon may discount, and the quantity it covers.
    pub fn applicable_total(&self, lines: &[CartLine], cart_total: Decimal) -> (Decimal, i64) {
        if !self.restricts_items() {
            return (cart_total, total_quantity(lines));
        }
        lines
            .iter()
            .filter(|line| self.applies_to(line))
            .fold((Decimal::ZERO, 0), |(total, qty), line| {
                (
                    total.saturating_add(line.subtotal()),
                    qty.saturating_add(line.quantity),
                )
            })
    }

    /// Discount for a cart that already passed eligibility. Never negative, never above
    /// the applicable total or `maximum_amount`.
    pub fn calculate_discount(&self, lines: &[CartLine], cart_total: Decimal) -> Decimal {
        let (applicable, quantity) = self.applicable_total(lines, cart_total);
        let amount = self.discount_amount();
        let raw = match self.discount_type {
            DiscountType::Percentage => applicable.saturating_mul(amount) / Decimal::ONE_HUNDRED,
            DiscountType::FixedCart => amount,
            DiscountType::FixedProduct => amount.saturating_mul(Decimal::from(quantity)),
        };

        let mut discount = raw.min(applicable);
        if let Some(max) = self.maximum_amount() {
            discount = discount.min(max);
        }
        round_money(discount.max(Decimal::ZERO))
    }
}

fn lowercase(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .collect()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coupon_usage::Entity")]
    Usages,
}

impl Related<super::coupon_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use serde_json::json;

    pub(crate) fn coupon(discount_type: DiscountType, amount: Decimal) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            code: "TEST".into(),
            description: None,
            discount_type,
            discount_amount_hundredths: crate::models::money::to_cents(amount).unwrap(),
            start_date: now - Duration::days(1),
            end_date: None,
            usage_limit: None,
            usage_limit_per_user: None,
            usage_count: 0,
            product_ids: json!([]),
            excluded_product_ids: json!([]),
            category_ids: json!([]),
            excluded_category_ids: json!([]),
            allowed_emails: json!([]),
            excluded_emails: json!([]),
            individual_use: false,
            exclude_sale_items: false,
            free_shipping: false,
            minimum_amount_cents: None,
            maximum_amount_cents: None,
            vendor_id: None,
            scope: CouponScope::Global,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percentage_of_full_cart() {
        let c = coupon(DiscountType::Percentage, dec!(20));
        let lines = vec![CartLine::new(Uuid::new_v4(), 1, dec!(100))];
        assert_eq!(c.calculate_discount(&lines, dec!(100)), dec!(20.00));
    }

    #[test]
    fn fixed_cart_clamped_to_applicable_total() {
        let c = coupon(DiscountType::FixedCart, dec!(50));
        let lines = vec![CartLine::new(Uuid::new_v4(), 1, dec!(30))];
        assert_eq!(c.calculate_discount(&lines, dec!(30)), dec!(30));
    }

    #[test]
    fn fixed_product_multiplies_quantities_and_respects_maximum() {
        let mut c = coupon(DiscountType::FixedProduct, dec!(4));
        let lines = vec![
            CartLine::new(Uuid::new_v4(), 3, dec!(10)),
            CartLine::new(Uuid::new_v4(), 2, dec!(10)),
        ];
        assert_eq!(c.calculate_discount(&lines, dec!(50)), dec!(20));
        c.maximum_amount_cents = Some(1500);
        assert_eq!(c.calculate_discount(&lines, dec!(50)), dec!(15));
    }

    #[test]
    fn negative_maximum_never_yields_negative_discount() {
        let mut c = coupon(DiscountType::Percentage, dec!(10));
        c.maximum_amount_cents = Some(-500);
        let lines = vec![CartLine::new(Uuid::new_v4(), 1, dec!(50))];
        assert_eq!(c.calculate_discount(&lines, dec!(50)), Decimal::ZERO);
    }

    #[test]
    fn inclusion_and_exclusion_restrict_applicable_total() {
        let included = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut c = coupon(DiscountType::Percentage, dec!(10));
        c.product_ids = json!([included]);
        let lines = vec![
            CartLine::new(included, 2, dec!(25)),
            CartLine::new(other, 1, dec!(100)),
        ];
        assert_eq!(c.applicable_total(&lines, dec!(150)), (dec!(50), 2));
        assert_eq!(c.calculate_discount(&lines, dec!(150)), dec!(5.00));

        c.excluded_product_ids = json!([included]);
        assert_eq!(c.applicable_total(&lines, dec!(150)).0, Decimal::ZERO);
    }

    #[test]
    fn sale_items_and_vendor_scope() {
        let vendor = Uuid::new_v4();
        let mut c = coupon(DiscountType::Percentage, dec!(50));
        c.exclude_sale_items = true;
        c.scope = CouponScope::Vendor;
        c.vendor_id = Some(vendor);

        let mut on_sale = CartLine::new(Uuid::new_v4(), 1, dec!(40));
        on_sale.on_sale = true;
        on_sale.vendor_id = Some(vendor);
        let mut vendor_item = CartLine::new(Uuid::new_v4(), 1, dec!(20));
        vendor_item.vendor_id = Some(vendor);
        let foreign = CartLine::new(Uuid::new_v4(), 1, dec!(60));

        let lines = vec![on_sale, vendor_item, foreign];
        assert_eq!(c.applicable_total(&lines, dec!(120)), (dec!(20), 1));
    }

    #[test]
    fn category_inclusion() {
        let category = Uuid::new_v4();
        let mut c = coupon(DiscountType::Percentage, dec!(10));
        c.category_ids = json!([category]);
        let mut line = CartLine::new(Uuid::new_v4(), 1, dec!(80));
        line.category_ids = vec![category];
        let lines = vec![line, CartLine::new(Uuid::new_v4(), 1, dec!(20))];
        assert_eq!(c.applicable_total(&lines, dec!(100)).0, dec!(80));
    }

    #[test]
    fn validity_window_and_usage_cap() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::FixedCart, dec!(5));
        assert!(c.is_valid_at(now));

        c.end_date = Some(now - Duration::hours(1));
        assert_eq!(c.check_validity(now), Err(CouponRejection::Expired));

        c.end_date = None;
        c.start_date = now + Duration::hours(1);
        assert_eq!(c.check_validity(now), Err(CouponRejection::NotStarted));

        c.start_date = now - Duration::hours(1);
        c.usage_limit = Some(2);
        c.usage_count = 2;
        assert_eq!(c.check_validity(now), Err(CouponRejection::UsageLimitReached));

        c.usage_count = 1;
        c.is_active = false;
        assert!(!c.is_valid_at(now));
    }

    #[test]
    fn email_lists_are_case_insensitive() {
        let mut c = coupon(DiscountType::FixedCart, dec!(5));
        assert!(c.email_allowed(None));

        c.allowed_emails = json!(["VIP@Example.com"]);
        assert!(c.email_allowed(Some("vip@example.com")));
        assert!(!c.email_allowed(Some("other@example.com")));
        assert!(!c.email_allowed(None));

        c.allowed_emails = json!([]);
        c.excluded_emails = json!(["banned@example.com"]);
        assert!(!c.email_allowed(Some("Banned@Example.com")));
        assert!(c.email_allowed(Some("fine@example.com")));
    }

    #[test]
    fn per_user_limit() {
        let mut c = coupon(DiscountType::FixedCart, dec!(5));
        assert!(!c.per_user_limit_reached(10));
        c.usage_limit_per_user = Some(1);
        assert!(!c.per_user_limit_reached(0));
        assert!(c.per_user_limit_reached(1));
    }
}
