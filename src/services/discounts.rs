//! Discount resolution.
//!
//! The engine evaluates, in this order:
//! 1. the coupon, against the original cart total;
//! 2. the gift card, against what the coupon left of the cart;
//! 3. automatic discounts, each against the original cart total.
//!
//! Everything stacks. A rejected coupon or gift card contributes zero and is reported
//! in the breakdown instead of failing the call.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::DiscountRulesConfig,
    entities::{
        coupon::{self, CouponRejection},
        gift_card::{self, GiftCardRejection},
        order, product, user,
    },
    errors::ServiceError,
    metrics::DISCOUNT_REJECTIONS,
    models::{
        cart::{cart_subtotal, total_quantity},
        money::{ensure_amount, percent_of, round_money},
        CartLine,
    },
    services::{coupons, gift_cards},
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: Uuid,
    pub variation_id: Option<Uuid>,
    #[validate(range(min = 1, max = 1000000, message = "quantity must be between 1 and 1000000"))]
    pub quantity: i64,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CalculateDiscountsRequest {
    #[validate(length(min = 1, message = "cart must contain at least one item"))]
    pub cart_items: Vec<CartItemInput>,
    /// Derived from the items when absent.
    pub cart_total: Option<Decimal>,
    pub user_id: Option<Uuid>,
    #[validate(email)]
    pub user_email: Option<String>,
    pub coupon_code: Option<String>,
    pub gift_card_code: Option<String>,
    #[serde(default)]
    pub shipping_cost: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomaticDiscountKind {
    HighValueCart,
    MidValueCart,
    FirstOrder,
    BulkQuantity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomaticDiscount {
    pub kind: AutomaticDiscountKind,
    pub label: String,
    pub amount: Decimal,
}

/// A code that was supplied but contributed nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRejection {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_type: coupon::DiscountType,
    pub free_shipping: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedGiftCard {
    pub code: String,
    pub balance: Decimal,
    pub remaining_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountBreakdown {
    pub cart_total: Decimal,
    pub coupon: Option<AppliedCoupon>,
    pub coupon_discount: Decimal,
    pub coupon_error: Option<DiscountRejection>,
    pub gift_card: Option<AppliedGiftCard>,
    pub gift_card_discount: Decimal,
    pub gift_card_error: Option<DiscountRejection>,
    pub automatic_discounts: Vec<AutomaticDiscount>,
    pub total_discount: Decimal,
    pub free_shipping: bool,
    pub shipping_cost: Decimal,
    pub final_total: Decimal,
    /// Internal: typed rejections, so checkout can abort with the right error.
    #[serde(skip)]
    pub coupon_rejection: Option<CouponRejection>,
    #[serde(skip)]
    pub gift_card_rejection: Option<GiftCardRejection>,
    #[serde(skip)]
    pub coupon_id: Option<Uuid>,
    #[serde(skip)]
    pub gift_card_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1, message = "cart must contain at least one item"))]
    pub cart_items: Vec<CartItemInput>,
    pub user_id: Option<Uuid>,
    #[validate(email)]
    pub user_email: Option<String>,
}

/// Eligibility of one coupon for a cart, without settling anything.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    pub code: String,
    pub valid: bool,
    pub discount: Decimal,
    pub free_shipping: bool,
    pub error: Option<DiscountRejection>,
}

/// Coupon lookup result, with prior redemptions by the same customer.
#[derive(Debug, Clone)]
pub struct CouponCandidate {
    pub code: String,
    pub coupon: Option<coupon::Model>,
    pub times_used_by_customer: u64,
}

#[derive(Debug, Clone)]
pub struct GiftCardCandidate {
    pub code: String,
    pub card: Option<gift_card::Model>,
}

/// Everything the engine needs. Built by [`DiscountService`] from database lookups.
#[derive(Debug, Clone)]
pub struct DiscountInput {
    pub lines: Vec<CartLine>,
    pub cart_total: Decimal,
    pub shipping_cost: Decimal,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub coupon: Option<CouponCandidate>,
    pub gift_card: Option<GiftCardCandidate>,
    /// Prior paid orders, `None` for anonymous carts.
    pub paid_order_count: Option<u64>,
    pub now: DateTime<Utc>,
}

pub fn evaluate_coupon(
    coupon: &coupon::Model,
    times_used_by_customer: u64,
    email: Option<&str>,
    lines: &[CartLine],
    cart_total: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal, CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    coupon.check_validity(now)?;
    if coupon.per_user_limit_reached(times_used_by_customer) {
        return Err(CouponRejection::PerUserLimitReached);
    }
    if !coupon.email_allowed(email) {
        return Err(CouponRejection::EmailNotAllowed);
    }
    if let Some(minimum) = coupon.minimum_amount() {
        if cart_total < minimum {
            return Err(CouponRejection::MinimumNotMet { minimum });
        }
    }
    if coupon.restricts_items() && coupon.applicable_total(lines, cart_total).0.is_zero() {
        return Err(CouponRejection::NoApplicableItems);
    }
    Ok(coupon.calculate_discount(lines, cart_total))
}

pub fn evaluate_gift_card(
    card: &gift_card::Model,
    user_id: Option<Uuid>,
    email: Option<&str>,
    remainder: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal, GiftCardRejection> {
    if !card.is_active {
        return Err(GiftCardRejection::Inactive);
    }
    card.check_validity(now)?;
    if !card.usable_by(user_id, email) {
        return Err(GiftCardRejection::NotOwner);
    }
    Ok(round_money(card.current_balance().min(remainder).max(Decimal::ZERO)))
}

pub fn automatic_discounts(
    rules: &DiscountRulesConfig,
    cart_total: Decimal,
    quantity: i64,
    paid_order_count: Option<u64>,
) -> Vec<AutomaticDiscount> {
    let mut discounts = Vec::new();

    if cart_total >= rules.high_tier_threshold {
        discounts.push(AutomaticDiscount {
            kind: AutomaticDiscountKind::HighValueCart,
            label: format!("{}% off orders of {} or more", rules.high_tier_percent, rules.high_tier_threshold),
            amount: percent_of(cart_total, rules.high_tier_percent),
        });
    } else if cart_total >= rules.low_tier_threshold {
        discounts.push(AutomaticDiscount {
            kind: AutomaticDiscountKind::MidValueCart,
            label: format!("{}% off orders of {} or more", rules.low_tier_percent, rules.low_tier_threshold),
            amount: percent_of(cart_total, rules.low_tier_percent),
        });
    }

    if paid_order_count == Some(0) {
        discounts.push(AutomaticDiscount {
            kind: AutomaticDiscountKind::FirstOrder,
            label: format!("{}% off your first order", rules.first_order_percent),
            amount: percent_of(cart_total, rules.first_order_percent),
        });
    }

    if quantity >= rules.bulk_min_quantity {
        discounts.push(AutomaticDiscount {
            kind: AutomaticDiscountKind::BulkQuantity,
            label: format!("{}% off {} or more items", rules.bulk_percent, rules.bulk_min_quantity),
            amount: percent_of(cart_total, rules.bulk_percent),
        });
    }

    discounts
}

pub fn compute_breakdown(rules: &DiscountRulesConfig, input: &DiscountInput) -> DiscountBreakdown {
    let cart_total = round_money(input.cart_total);
    let email = input.email.as_deref();

    let mut breakdown = DiscountBreakdown {
        cart_total,
        coupon: None,
        coupon_discount: Decimal::ZERO,
        coupon_error: None,
        gift_card: None,
        gift_card_discount: Decimal::ZERO,
        gift_card_error: None,
        automatic_discounts: Vec::new(),
        total_discount: Decimal::ZERO,
        free_shipping: false,
        shipping_cost: round_money(input.shipping_cost),
        final_total: Decimal::ZERO,
        coupon_rejection: None,
        gift_card_rejection: None,
        coupon_id: None,
        gift_card_id: None,
    };

    if let Some(candidate) = &input.coupon {
        let outcome = match &candidate.coupon {
            None => Err(CouponRejection::NotFound),
            Some(coupon) => evaluate_coupon(
                coupon,
                candidate.times_used_by_customer,
                email,
                &input.lines,
                cart_total,
                input.now,
            )
            .map(|discount| (coupon, discount)),
        };
        match outcome {
            Ok((coupon, discount)) => {
                breakdown.coupon_discount = discount;
                breakdown.free_shipping = coupon.free_shipping;
                breakdown.coupon_id = Some(coupon.id);
                breakdown.coupon = Some(AppliedCoupon {
                    code: coupon.code.clone(),
                    discount_type: coupon.discount_type,
                    free_shipping: coupon.free_shipping,
                });
            }
            Err(rejection) => {
                DISCOUNT_REJECTIONS.with_label_values(&["coupon"]).inc();
                debug!(code = %candidate.code, reason = rejection.code(), "coupon rejected");
                breakdown.coupon_error = Some(DiscountRejection {
                    kind: rejection.code(),
                    message: rejection.message(),
                });
                breakdown.coupon_rejection = Some(rejection);
            }
        }
    }

    if let Some(candidate) = &input.gift_card {
        let remainder = (cart_total - breakdown.coupon_discount).max(Decimal::ZERO);
        let outcome = match &candidate.card {
            None => Err(GiftCardRejection::NotFound),
            Some(card) => evaluate_gift_card(card, input.user_id, email, remainder, input.now)
                .map(|discount| (card, discount)),
        };
        match outcome {
            Ok((card, discount)) => {
                breakdown.gift_card_discount = discount;
                breakdown.gift_card_id = Some(card.id);
                breakdown.gift_card = Some(AppliedGiftCard {
                    code: card.code.clone(),
                    balance: card.current_balance(),
                    remaining_balance: card.current_balance() - discount,
                });
            }
            Err(rejection) => {
                DISCOUNT_REJECTIONS.with_label_values(&["gift_card"]).inc();
                debug!(reason = rejection.code(), "gift card rejected");
                breakdown.gift_card_error = Some(DiscountRejection {
                    kind: rejection.code(),
                    message: rejection.message().to_string(),
                });
                breakdown.gift_card_rejection = Some(rejection);
            }
        }
    }

    breakdown.automatic_discounts = automatic_discounts(
        rules,
        cart_total,
        total_quantity(&input.lines),
        input.paid_order_count,
    );

    breakdown.total_discount = breakdown.coupon_discount
        + breakdown.gift_card_discount
        + breakdown
            .automatic_discounts
            .iter()
            .map(|d| d.amount)
            .sum::<Decimal>();

    if breakdown.free_shipping {
        breakdown.shipping_cost = Decimal::ZERO;
    }
    breakdown.final_total =
        (cart_total - breakdown.total_discount).max(Decimal::ZERO) + breakdown.shipping_cost;
    breakdown
}

#[derive(Clone)]
pub struct DiscountService {
    db: Arc<DatabaseConnection>,
    rules: DiscountRulesConfig,
}

impl DiscountService {
    pub fn new(db: Arc<DatabaseConnection>, rules: DiscountRulesConfig) -> Self {
        Self { db, rules }
    }

    #[instrument(skip(self, request), fields(coupon = ?request.coupon_code, items = request.cart_items.len()))]
    pub async fn calculate_discounts(
        &self,
        request: &CalculateDiscountsRequest,
    ) -> Result<DiscountBreakdown, ServiceError> {
        request.validate()?;
        for item in &request.cart_items {
            item.validate()?;
            ensure_amount(&format!("price for product {}", item.product_id), item.price)?;
        }
        ensure_amount("shippingCost", request.shipping_cost)?;

        let lines = self.enrich_lines(&request.cart_items).await?;
        let derived_total = cart_subtotal(&lines)?;
        if derived_total.is_sign_negative() {
            return Err(ServiceError::InvalidInput(
                "cart total cannot be negative".to_string(),
            ));
        }
        let cart_total = match request.cart_total {
            Some(total) => {
                ensure_amount("cartTotal", total)?;
                total
            }
            None => derived_total,
        };

        let email = self.resolve_email(request.user_id, request.user_email.as_deref()).await?;
        let input = DiscountInput {
            coupon: self
                .coupon_candidate(request.coupon_code.as_deref(), request.user_id, email.as_deref())
                .await?,
            gift_card: self.gift_card_candidate(request.gift_card_code.as_deref()).await?,
            paid_order_count: match request.user_id {
                Some(user_id) => Some(self.paid_order_count(user_id).await?),
                None => None,
            },
            lines,
            cart_total,
            shipping_cost: request.shipping_cost,
            user_id: request.user_id,
            email,
            now: Utc::now(),
        };

        Ok(compute_breakdown(&self.rules, &input))
    }

    #[instrument(skip(self, request), fields(coupon = %request.code))]
    pub async fn validate_coupon(
        &self,
        request: ValidateCouponRequest,
    ) -> Result<CouponValidation, ServiceError> {
        request.validate()?;
        let code = coupons::normalize_coupon_code(&request.code);
        let breakdown = self
            .calculate_discounts(&CalculateDiscountsRequest {
                cart_items: request.cart_items,
                cart_total: None,
                user_id: request.user_id,
                user_email: request.user_email,
                coupon_code: Some(code.clone()),
                gift_card_code: None,
                shipping_cost: Decimal::ZERO,
            })
            .await?;

        Ok(CouponValidation {
            code,
            valid: breakdown.coupon.is_some(),
            discount: breakdown.coupon_discount,
            free_shipping: breakdown.free_shipping,
            error: breakdown.coupon_error,
        })
    }

    /// Adds category, sale and vendor facts from the catalog. Unknown products are priced
    /// as submitted and match no scoped coupon.
    async fn enrich_lines(&self, items: &[CartItemInput]) -> Result<Vec<CartLine>, ServiceError> {
        let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
        let products: HashMap<Uuid, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(items
            .iter()
            .map(|item| {
                let mut line = CartLine::new(item.product_id, item.quantity, item.price);
                line.variation_id = item.variation_id;
                match products.get(&item.product_id) {
                    Some(p) => {
                        line.category_ids = p.categories();
                        line.on_sale = p.on_sale;
                        line.vendor_id = p.vendor_id;
                    }
                    None => warn!(product_id = %item.product_id, "cart item not in catalog"),
                }
                line
            })
            .collect())
    }

    /// A supplied email wins; otherwise the registered user's address.
    pub(crate) async fn resolve_email(
        &self,
        user_id: Option<Uuid>,
        supplied: Option<&str>,
    ) -> Result<Option<String>, ServiceError> {
        if let Some(email) = supplied.filter(|e| !e.trim().is_empty()) {
            return Ok(Some(email.trim().to_lowercase()));
        }
        match user_id {
            Some(id) => Ok(user::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .map(|u| u.email.to_lowercase())),
            None => Ok(None),
        }
    }

    async fn coupon_candidate(
        &self,
        code: Option<&str>,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<CouponCandidate>, ServiceError> {
        let Some(code) = code.filter(|c| !c.trim().is_empty()) else {
            return Ok(None);
        };
        let coupon = coupons::find_coupon(&*self.db, code).await?;
        let times_used_by_customer = match &coupon {
            Some(c) => coupons::times_used_by(&*self.db, c.id, user_id, email).await?,
            None => 0,
        };
        Ok(Some(CouponCandidate {
            code: coupons::normalize_coupon_code(code),
            coupon,
            times_used_by_customer,
        }))
    }

    async fn gift_card_candidate(
        &self,
        code: Option<&str>,
    ) -> Result<Option<GiftCardCandidate>, ServiceError> {
        let Some(code) = code.filter(|c| !c.trim().is_empty()) else {
            return Ok(None);
        };
        Ok(Some(GiftCardCandidate {
            code: gift_card::normalize_code(code),
            card: gift_cards::find_gift_card(&*self.db, code).await?,
        }))
    }

    async fn paid_order_count(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(Expr::expr(Func::lower(Expr::col(order::Column::PaymentStatus))).eq("paid"))
            .count(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::coupon::{tests::coupon, DiscountType};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn input(cart_total: Decimal) -> DiscountInput {
        DiscountInput {
            lines: vec![CartLine::new(Uuid::new_v4(), 1, cart_total)],
            cart_total,
            shipping_cost: Decimal::ZERO,
            user_id: None,
            email: None,
            coupon: None,
            gift_card: None,
            paid_order_count: None,
            now: Utc::now(),
        }
    }

    fn with_coupon(model: coupon::Model) -> Option<CouponCandidate> {
        Some(CouponCandidate {
            code: model.code.clone(),
            coupon: Some(model),
            times_used_by_customer: 0,
        })
    }

    fn card(balance_cents: i64) -> gift_card::Model {
        let now = Utc::now();
        gift_card::Model {
            id: Uuid::new_v4(),
            code: "GIFT30".into(),
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
    fn percentage_coupon_on_hundred_dollar_cart() {
        let rules = DiscountRulesConfig::default();
        let mut i = input(dec!(100));
        i.coupon = with_coupon(coupon(DiscountType::Percentage, dec!(20)));

        let b = compute_breakdown(&rules, &i);
        assert_eq!(b.coupon_discount, dec!(20.00));
        // $100 also hits the 3% tier.
        assert_eq!(b.automatic_discounts.len(), 1);
        assert_eq!(b.automatic_discounts[0].amount, dec!(3.00));
        assert_eq!(b.final_total, dec!(77.00));
    }

    #[test]
    fn minimum_not_met_is_reported_not_raised() {
        let rules = DiscountRulesConfig::default();
        let mut flat = coupon(DiscountType::FixedCart, dec!(15));
        flat.minimum_amount_cents = Some(5000);
        let mut i = input(dec!(40));
        i.coupon = with_coupon(flat);

        let b = compute_breakdown(&rules, &i);
        assert_eq!(b.coupon_discount, Decimal::ZERO);
        assert_eq!(b.coupon_error.as_ref().map(|e| e.kind), Some("minimum_not_met"));
        assert_eq!(b.final_total, dec!(40.00));
    }

    #[test]
    fn gift_card_applies_to_coupon_remainder() {
        let rules = DiscountRulesConfig::default();
        let mut i = input(dec!(100));
        i.shipping_cost = dec!(7.50);
        i.coupon = with_coupon(coupon(DiscountType::FixedCart, dec!(20)));
        i.gift_card = Some(GiftCardCandidate {
            code: "GIFT30".into(),
            card: Some(card(3000)),
        });

        let b = compute_breakdown(&rules, &i);
        assert_eq!(b.gift_card_discount, dec!(30.00));
        assert_eq!(b.coupon_discount + b.gift_card_discount, dec!(50.00));
        let automatic: Decimal = b.automatic_discounts.iter().map(|d| d.amount).sum();
        assert_eq!(b.total_discount, dec!(50.00) + automatic);
        assert_eq!(b.final_total, dec!(100) - b.total_discount + dec!(7.50));
    }

    #[test]
    fn gift_card_capped_by_remainder() {
        let rules = DiscountRulesConfig::default();
        let mut i = input(dec!(50));
        i.coupon = with_coupon(coupon(DiscountType::FixedCart, dec!(40)));
        i.gift_card = Some(GiftCardCandidate {
            code: "GIFT30".into(),
            card: Some(card(3000)),
        });

        let b = compute_breakdown(&rules, &i);
        assert_eq!(b.gift_card_discount, dec!(10.00));
        assert_eq!(b.gift_card.unwrap().remaining_balance, dec!(20.00));
    }

    #[test]
    fn unknown_codes_are_rejections() {
        let rules = DiscountRulesConfig::default();
        let mut i = input(dec!(20));
        i.coupon = Some(CouponCandidate {
            code: "NOPE".into(),
            coupon: None,
            times_used_by_customer: 0,
        });
        i.gift_card = Some(GiftCardCandidate {
            code: "NOPE".into(),
            card: None,
        });

        let b = compute_breakdown(&rules, &i);
        assert_eq!(b.coupon_rejection, Some(CouponRejection::NotFound));
        assert_eq!(b.gift_card_rejection, Some(GiftCardRejection::NotFound));
        assert_eq!(b.total_discount, Decimal::ZERO);
    }

    #[test]
    fn per_user_limit_beats_remaining_global_limit() {
        let mut once = coupon(DiscountType::FixedCart, dec!(5));
        once.usage_limit = Some(100);
        once.usage_limit_per_user = Some(1);
        let lines = vec![CartLine::new(Uuid::new_v4(), 1, dec!(30))];
        assert_eq!(
            evaluate_coupon(&once, 1, None, &lines, dec!(30), Utc::now()),
            Err(CouponRejection::PerUserLimitReached)
        );
    }

    #[test]
    fn first_time_buyer_gets_ten_percent() {
        let rules = DiscountRulesConfig::default();
        let mut i = input(dec!(50));
        i.user_id = Some(Uuid::new_v4());
        i.paid_order_count = Some(0);

        let b = compute_breakdown(&rules, &i);
        assert_eq!(b.automatic_discounts.len(), 1);
        assert_eq!(b.automatic_discounts[0].kind, AutomaticDiscountKind::FirstOrder);
        assert_eq!(b.total_discount, dec!(5.00));
    }

    #[test]
    fn tiers_are_exclusive_and_rules_stack() {
        let rules = DiscountRulesConfig::default();
        let found = automatic_discounts(&rules, dec!(250), 12, Some(0));
        let kinds: Vec<_> = found.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AutomaticDiscountKind::HighValueCart,
                AutomaticDiscountKind::FirstOrder,
                AutomaticDiscountKind::BulkQuantity
            ]
        );
        let total: Decimal = found.iter().map(|d| d.amount).sum();
        assert_eq!(total, dec!(12.50) + dec!(25.00) + dec!(12.50));
    }

    #[test]
    fn free_shipping_drops_shipping() {
        let rules = DiscountRulesConfig::default();
        let mut free = coupon(DiscountType::FixedCart, dec!(1));
        free.free_shipping = true;
        let mut i = input(dec!(20));
        i.shipping_cost = dec!(9.99);
        i.coupon = with_coupon(free);

        let b = compute_breakdown(&rules, &i);
        assert!(b.free_shipping);
        assert_eq!(b.shipping_cost, Decimal::ZERO);
        assert_eq!(b.final_total, dec!(19.00));
    }

    proptest! {
        #[test]
        fn coupon_discount_is_bounded(
            cents in 0i64..1_000_000,
            amount in 1i64..50_000,
            max_cents in proptest::option::of(-10_000i64..100_000),
            kind in 0u8..3,
        ) {
            let discount_type = match kind {
                0 => DiscountType::Percentage,
                1 => DiscountType::FixedCart,
                _ => DiscountType::FixedProduct,
            };
            let mut c = coupon(discount_type, Decimal::new(amount.min(10_000), 2));
            c.maximum_amount_cents = max_cents;
            let total = Decimal::new(cents, 2);
            let lines = vec![CartLine::new(Uuid::new_v4(), 2, total / Decimal::TWO)];

            let discount = c.calculate_discount(&lines, total);
            prop_assert!(discount >= Decimal::ZERO);
            prop_assert!(discount <= total);
            if let Some(max) = max_cents {
                prop_assert!(discount <= Decimal::new(max.max(0), 2));
            }
        }

        #[test]
        fn final_total_never_below_shipping(
            cents in 0i64..500_000,
            shipping in 0i64..5_000,
            balance in 1i64..500_000,
        ) {
            let rules = DiscountRulesConfig::default();
            let mut i = input(Decimal::new(cents, 2));
            i.shipping_cost = Decimal::new(shipping, 2);
            i.paid_order_count = Some(0);
            i.gift_card = Some(GiftCardCandidate { code: "G".into(), card: Some(card(balance)) });

            let b = compute_breakdown(&rules, &i);
            prop_assert!(b.final_total >= b.shipping_cost);
            prop_assert!(b.gift_card_discount <= b.cart_total);
        }
    }
}
