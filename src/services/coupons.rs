use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::{Condition, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        coupon::{self, CouponScope, DiscountType},
        coupon_usage, json_list,
    },
    errors::ServiceError,
    models::money::to_cents,
};

pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_amount: Decimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1))]
    pub usage_limit_per_user: Option<i32>,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
    #[serde(default)]
    pub excluded_product_ids: Vec<Uuid>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub excluded_category_ids: Vec<Uuid>,
    #[serde(default)]
    pub allowed_emails: Vec<String>,
    #[serde(default)]
    pub excluded_emails: Vec<String>,
    #[serde(default)]
    pub individual_use: bool,
    #[serde(default)]
    pub exclude_sale_items: bool,
    #[serde(default)]
    pub free_shipping: bool,
    pub minimum_amount: Option<Decimal>,
    pub maximum_amount: Option<Decimal>,
    pub vendor_id: Option<Uuid>,
    #[serde(default)]
    pub scope: CouponScope,
}

impl CreateCouponRequest {
    fn check_rules(&self) -> Result<(), ServiceError> {
        if self.discount_amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "discountAmount must be positive".to_string(),
            ));
        }
        if self.discount_type == DiscountType::Percentage && self.discount_amount > dec!(100) {
            return Err(ServiceError::ValidationError(
                "percentage discounts cannot exceed 100".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end <= start {
                return Err(ServiceError::ValidationError(
                    "endDate must be after startDate".to_string(),
                ));
            }
        }
        if self.minimum_amount.is_some_and(|min| min.is_sign_negative()) {
            return Err(ServiceError::ValidationError(
                "minimumAmount cannot be negative".to_string(),
            ));
        }
        if self.maximum_amount.is_some_and(|max| max.is_sign_negative()) {
            return Err(ServiceError::ValidationError(
                "maximumAmount cannot be negative".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (self.minimum_amount, self.maximum_amount) {
            if min > max {
                return Err(ServiceError::ValidationError(
                    "minimumAmount cannot exceed maximumAmount".to_string(),
                ));
            }
        }
        if self.scope == CouponScope::Vendor && self.vendor_id.is_none() {
            return Err(ServiceError::ValidationError(
                "VENDOR coupons need a vendorId".to_string(),
            ));
        }
        Ok(())
    }
}

/// Who redeemed a coupon, for the usage ledger.
#[derive(Debug, Clone)]
pub struct CouponRedemption {
    pub coupon_id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub discount_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CouponWithUsage {
    #[serde(flatten)]
    pub coupon: coupon::Model,
    pub used_by: Vec<coupon_usage::Model>,
}

#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_coupon(
        &self,
        request: CreateCouponRequest,
    ) -> Result<coupon::Model, ServiceError> {
        request.validate()?;
        request.check_rules()?;

        let code = normalize_coupon_code(&request.code);
        if find_coupon(&*self.db, &code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "coupon {} already exists",
                code
            )));
        }

        let now = Utc::now();
        let model = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.clone()),
            description: Set(request.description),
            discount_type: Set(request.discount_type),
            discount_amount_hundredths: Set(to_cents(request.discount_amount)?),
            start_date: Set(request.start_date.unwrap_or(now)),
            end_date: Set(request.end_date),
            usage_limit: Set(request.usage_limit),
            usage_limit_per_user: Set(request.usage_limit_per_user),
            usage_count: Set(0),
            product_ids: Set(json_list(&request.product_ids)),
            excluded_product_ids: Set(json_list(&request.excluded_product_ids)),
            category_ids: Set(json_list(&request.category_ids)),
            excluded_category_ids: Set(json_list(&request.excluded_category_ids)),
            allowed_emails: Set(json_list(&lowercase(request.allowed_emails))),
            excluded_emails: Set(json_list(&lowercase(request.excluded_emails))),
            individual_use: Set(request.individual_use),
            exclude_sale_items: Set(request.exclude_sale_items),
            free_shipping: Set(request.free_shipping),
            minimum_amount_cents: Set(request.minimum_amount.map(to_cents).transpose()?),
            maximum_amount_cents: Set(request.maximum_amount.map(to_cents).transpose()?),
            vendor_id: Set(request.vendor_id),
            scope: Set(request.scope),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            error!(error = %e, code = %code, "Failed to create coupon");
            ServiceError::DatabaseError(e)
        })?;

        info!(coupon_id = %model.id, code = %model.code, "Coupon created");
        Ok(model)
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<coupon::Model>, ServiceError> {
        find_coupon(&*self.db, code).await
    }

    pub async fn get_with_usage(&self, code: &str) -> Result<CouponWithUsage, ServiceError> {
        let coupon = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("coupon {}", normalize_coupon_code(code))))?;
        let used_by = coupon_usage::Entity::find()
            .filter(coupon_usage::Column::CouponId.eq(coupon.id))
            .order_by_asc(coupon_usage::Column::UsedAt)
            .all(&*self.db)
            .await?;
        Ok(CouponWithUsage { coupon, used_by })
    }

    pub async fn list_coupons(&self, active_only: bool) -> Result<Vec<coupon::Model>, ServiceError> {
        let mut query = coupon::Entity::find();
        if active_only {
            query = query.filter(coupon::Column::IsActive.eq(true));
        }
        Ok(query
            .order_by_asc(coupon::Column::Code)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn deactivate(&self, code: &str) -> Result<coupon::Model, ServiceError> {
        let coupon = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("coupon {}", normalize_coupon_code(code))))?;
        let mut active: coupon::ActiveModel = coupon.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }
}

pub async fn find_coupon<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<coupon::Model>, ServiceError> {
    Ok(coupon::Entity::find()
        .filter(coupon::Column::Code.eq(normalize_coupon_code(code)))
        .one(conn)
        .await?)
}

/// Prior redemptions by this customer: matched on user id when known, else on email.
pub async fn times_used_by<C: ConnectionTrait>(
    conn: &C,
    coupon_id: Uuid,
    user_id: Option<Uuid>,
    email: Option<&str>,
) -> Result<u64, ServiceError> {
    let customer = match (user_id, email) {
        (Some(user_id), _) => coupon_usage::Column::UserId.eq(user_id),
        (None, Some(email)) => coupon_usage::Column::Email.eq(email.trim().to_lowercase()),
        (None, None) => return Ok(0),
    };
    Ok(coupon_usage::Entity::find()
        .filter(coupon_usage::Column::CouponId.eq(coupon_id))
        .filter(customer)
        .count(conn)
        .await?)
}

/// Appends to the usage ledger and bumps `usage_count` in one guarded update, so the
/// global limit holds under concurrent checkouts.
pub async fn record_usage<C: ConnectionTrait>(
    conn: &C,
    redemption: &CouponRedemption,
    order_id: Uuid,
) -> Result<coupon_usage::Model, ServiceError> {
    let now = Utc::now();
    let result = coupon::Entity::update_many()
        .col_expr(
            coupon::Column::UsageCount,
            Expr::col(coupon::Column::UsageCount).add(1),
        )
        .col_expr(coupon::Column::UpdatedAt, Expr::value(now))
        .filter(coupon::Column::Id.eq(redemption.coupon_id))
        .filter(coupon::Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(coupon::Column::UsageLimit.is_null())
                .add(Expr::col(coupon::Column::UsageCount).lt(Expr::col(coupon::Column::UsageLimit))),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::CouponExpiredOrExhausted(
            "coupon usage limit has been reached".to_string(),
        ));
    }

    let usage = coupon_usage::ActiveModel {
        id: Set(Uuid::new_v4()),
        coupon_id: Set(redemption.coupon_id),
        user_id: Set(redemption.user_id),
        email: Set(redemption.email.as_ref().map(|e| e.trim().to_lowercase())),
        order_id: Set(Some(order_id)),
        discount_applied_cents: Set(redemption.discount_cents),
        used_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(usage)
}

fn lowercase(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request() -> CreateCouponRequest {
        serde_json::from_value(serde_json::json!({
            "code": "save20",
            "discountType": "percentage",
            "discountAmount": "20"
        }))
        .unwrap()
    }

    #[test]
    fn codes_are_upper_cased() {
        assert_eq!(normalize_coupon_code("  save20 "), "SAVE20");
    }

    #[test]
    fn rejects_percentage_above_hundred() {
        let mut req = request();
        req.discount_amount = dec!(120);
        assert_matches!(req.check_rules(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn rejects_inverted_window() {
        let mut req = request();
        let now = Utc::now();
        req.start_date = Some(now);
        req.end_date = Some(now - chrono::Duration::days(1));
        assert_matches!(req.check_rules(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn each_amount_bound_is_checked_alone() {
        let mut req = request();
        req.maximum_amount = Some(dec!(-5));
        assert_matches!(req.check_rules(), Err(ServiceError::ValidationError(_)));

        let mut req = request();
        req.minimum_amount = Some(dec!(-0.01));
        assert_matches!(req.check_rules(), Err(ServiceError::ValidationError(_)));

        let mut req = request();
        req.minimum_amount = Some(dec!(50));
        req.maximum_amount = Some(dec!(10));
        assert_matches!(req.check_rules(), Err(ServiceError::ValidationError(_)));

        req.maximum_amount = Some(dec!(50));
        assert_matches!(req.check_rules(), Ok(()));
    }

    #[test]
    fn vendor_scope_needs_vendor() {
        let mut req = request();
        req.scope = CouponScope::Vendor;
        assert_matches!(req.check_rules(), Err(ServiceError::ValidationError(_)));
        req.vendor_id = Some(Uuid::new_v4());
        assert!(req.check_rules().is_ok());
    }
}
