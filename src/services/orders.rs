use crate::{
    config::SettlementSettings,
    db::DbPool,
    entities::{
        order::{self, Entity as OrderEntity, Model as OrderModel},
        order_item::{self, Entity as OrderItemEntity},
        order_status_history,
        product::ProductType,
        user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::{FAILED_PAYMENT_ORDERS, ORDERS_CREATED},
    models::{
        money::{amounts_match, checked_total, ensure_amount, line_subtotal, round_money, to_cents},
        status::is_failed_payment,
        CustomerIdentity, GuestCustomer, OrderStatus,
    },
    notifications::{NotificationDispatcher, OrderNotification, OrderSummary},
    services::{
        coupons::{self, CouponRedemption},
        discounts::{CalculateDiscountsRequest, CartItemInput, DiscountBreakdown, DiscountService},
        gift_cards,
        inventory::{InventoryService, StockLine, StockOutcome},
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Actor recorded on the history entry written at creation.
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub variation_id: Option<Uuid>,
    #[serde(default)]
    pub product_type: ProductType,
    #[validate(range(min = 1, max = 1000000, message = "quantity must be between 1 and 1000000"))]
    pub quantity: i64,
    pub price: Decimal,
}

impl OrderLineInput {
    pub fn subtotal(&self) -> Result<Decimal, ServiceError> {
        line_subtotal(self.price, self.quantity)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "order must contain at least one product"))]
    pub products: Vec<OrderLineInput>,
    pub user_id: Option<Uuid>,
    pub guest_customer: Option<GuestCustomer>,
    pub payment_id: Option<String>,
    #[serde(default = "default_payment_status", alias = "payment_status")]
    pub payment_status: String,
    pub delivery_address_id: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub total_amt: Option<Decimal>,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
}

fn default_payment_status() -> String {
    "pending".to_string()
}

impl CreateOrderRequest {
    fn check(&self) -> Result<CustomerIdentity, ServiceError> {
        self.validate()?;
        for line in &self.products {
            line.validate()?;
            ensure_amount(&format!("price for product {}", line.product_id), line.price)?;
        }
        ensure_amount("shippingCost", self.shipping_cost)?;
        CustomerIdentity::from_parts(self.user_id, self.guest_customer.clone())
    }

    fn subtotal(&self) -> Result<Decimal, ServiceError> {
        checked_total(self.products.iter().map(OrderLineInput::subtotal))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub order: CreateOrderRequest,
    pub coupon_code: Option<String>,
    pub gift_card_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: OrderModel,
    pub items: Vec<order_item::Model>,
    pub status_history: Vec<order_status_history::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResult {
    pub order: OrderDetails,
    pub discounts: DiscountBreakdown,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderModel>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Where customer-facing mail for an order goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerContact {
    pub email: String,
    pub name: Option<String>,
}

/// Picks the total to persist.
///
/// Strict mode always stores the computed amount and refuses a positive caller total
/// that disagrees by more than a cent. Otherwise a positive caller total is trusted.
pub fn resolve_total(
    caller_total: Option<Decimal>,
    computed: Decimal,
    strict: bool,
) -> Result<Decimal, ServiceError> {
    let computed = round_money(computed);
    match caller_total {
        Some(total) if total > Decimal::ZERO => {
            if !strict {
                Ok(round_money(total))
            } else if amounts_match(total, computed) {
                Ok(computed)
            } else {
                Err(ServiceError::InvalidInput(format!(
                    "totalAmt {} does not match computed total {}",
                    total, computed
                )))
            }
        }
        _ => Ok(computed),
    }
}

pub fn generate_order_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

struct OrderDraft {
    identity: CustomerIdentity,
    lines: Vec<OrderLineInput>,
    subtotal: Decimal,
    discount: Decimal,
    shipping: Decimal,
    total: Decimal,
    currency: String,
    payment_id: Option<String>,
    payment_status: String,
    delivery_address_id: Option<String>,
    shipping_address: Option<serde_json::Value>,
    coupon_code: Option<String>,
    gift_card_code: Option<String>,
}

#[derive(Default)]
struct Redemptions {
    coupon: Option<CouponRedemption>,
    gift_card: Option<(Uuid, i64)>,
}

/// Settles carts into orders.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    notifier: NotificationDispatcher,
    inventory: InventoryService,
    discounts: DiscountService,
    settings: SettlementSettings,
    admin_email: String,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        notifier: NotificationDispatcher,
        discounts: DiscountService,
        settings: SettlementSettings,
        admin_email: String,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            notifier,
            inventory: InventoryService::new(settings.stock_policy),
            discounts,
            settings,
            admin_email,
        }
    }

    /// Records an order from a priced cart. Codes are not redeemed here; see [`Self::checkout`].
    #[instrument(skip(self, request), fields(lines = request.products.len(), payment_status = %request.payment_status))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderDetails, ServiceError> {
        let identity = request.check()?;
        let subtotal = round_money(request.subtotal()?);
        let shipping = round_money(request.shipping_cost);
        let total = resolve_total(
            request.total_amt,
            subtotal + shipping,
            self.settings.strict_totals,
        )?;

        let draft = self.draft(request, identity, subtotal, Decimal::ZERO, shipping, total);
        self.settle(draft, Redemptions::default()).await
    }

    /// Prices the cart server-side, then settles it and redeems the codes atomically.
    #[instrument(skip(self, request), fields(coupon = ?request.coupon_code, lines = request.order.products.len()))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutResult, ServiceError> {
        let CheckoutRequest {
            order: request,
            coupon_code,
            gift_card_code,
        } = request;
        let identity = request.check()?;

        let email = self
            .discounts
            .resolve_email(
                identity.user_id(),
                identity.guest().map(|g| g.email.as_str()),
            )
            .await?;
        let breakdown = self
            .discounts
            .calculate_discounts(&CalculateDiscountsRequest {
                cart_items: request
                    .products
                    .iter()
                    .map(|line| CartItemInput {
                        product_id: line.product_id,
                        variation_id: line.variation_id,
                        quantity: line.quantity,
                        price: line.price,
                    })
                    .collect(),
                cart_total: None,
                user_id: identity.user_id(),
                user_email: email.clone(),
                coupon_code: coupon_code.clone(),
                gift_card_code,
                shipping_cost: request.shipping_cost,
            })
            .await?;

        if let Some(rejection) = breakdown.coupon_rejection.clone() {
            let code = coupon_code.as_deref().map(coupons::normalize_coupon_code).unwrap_or_default();
            return Err(rejection.into_error(&code));
        }
        if let Some(rejection) = breakdown.gift_card_rejection.clone() {
            return Err(rejection.into_error());
        }

        let total = resolve_total(
            request.total_amt,
            breakdown.final_total,
            self.settings.strict_totals,
        )?;

        let coupon_cents = to_cents(breakdown.coupon_discount)?;
        let gift_card_cents = to_cents(breakdown.gift_card_discount)?;
        let redemptions = Redemptions {
            coupon: breakdown.coupon_id.map(|coupon_id| CouponRedemption {
                coupon_id,
                user_id: identity.user_id(),
                email: email.clone(),
                discount_cents: coupon_cents,
            }),
            gift_card: breakdown
                .gift_card_id
                .filter(|_| breakdown.gift_card_discount > Decimal::ZERO)
                .map(|id| (id, gift_card_cents)),
        };

        let mut draft = self.draft(
            request,
            identity,
            breakdown.cart_total,
            breakdown.total_discount,
            breakdown.shipping_cost,
            total,
        );
        draft.coupon_code = breakdown.coupon.as_ref().map(|c| c.code.clone());
        draft.gift_card_code = breakdown.gift_card.as_ref().map(|g| g.code.clone());

        let order = self.settle(draft, redemptions).await?;
        Ok(CheckoutResult {
            order,
            discounts: breakdown,
        })
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetails, ServiceError> {
        let db = &*self.db_pool;
        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order from database");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::OrderNotFound(order_id.to_string()))?;
        load_details(db, order).await
    }

    /// Orders of a registered customer, newest first. `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list_orders_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let paginator = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }

    fn draft(
        &self,
        request: CreateOrderRequest,
        identity: CustomerIdentity,
        subtotal: Decimal,
        discount: Decimal,
        shipping: Decimal,
        total: Decimal,
    ) -> OrderDraft {
        OrderDraft {
            identity,
            lines: request.products,
            subtotal,
            discount,
            shipping,
            total,
            currency: request
                .currency
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| self.settings.default_currency.clone()),
            payment_id: request.payment_id,
            payment_status: request.payment_status.trim().to_string(),
            delivery_address_id: request.delivery_address_id,
            shipping_address: request.shipping_address,
            coupon_code: None,
            gift_card_code: None,
        }
    }

    /// One transaction: order, lines, first history entry and, unless payment failed,
    /// stock, sales counters and code redemptions. Mail and events follow the commit.
    async fn settle(&self, draft: OrderDraft, redemptions: Redemptions) -> Result<OrderDetails, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let payment_failed = is_failed_payment(&draft.payment_status);

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            user_id: Set(draft.identity.user_id()),
            guest_customer: Set(draft
                .identity
                .guest()
                .and_then(|g| serde_json::to_value(g).ok())),
            subtotal_cents: Set(to_cents(draft.subtotal)?),
            discount_cents: Set(to_cents(draft.discount)?),
            shipping_cents: Set(to_cents(draft.shipping)?),
            total_cents: Set(to_cents(draft.total)?),
            currency: Set(draft.currency.clone()),
            payment_id: Set(draft.payment_id.clone()),
            payment_status: Set(draft.payment_status.clone()),
            delivery_address_id: Set(draft.delivery_address_id.clone()),
            shipping_address: Set(draft.shipping_address.clone()),
            status: Set(OrderStatus::Received),
            tracking_number: Set(None),
            estimated_delivery: Set(None),
            coupon_code: Set(draft.coupon_code.clone()),
            gift_card_code: Set(draft.gift_card_code.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(draft.lines.len());
        for (position, line) in draft.lines.iter().enumerate() {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                position: Set(position as i32),
                product_id: Set(line.product_id),
                variation_id: Set(line.variation_id),
                product_type: Set(line.product_type),
                quantity: Set(line.quantity),
                unit_price_cents: Set(to_cents(line.price)?),
                subtotal_cents: Set(to_cents(line.subtotal()?)?),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        let history = order_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            position: Set(0),
            status: Set(OrderStatus::Received),
            updated_by: Set(SYSTEM_ACTOR.to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut events = Vec::new();
        if !payment_failed {
            for item in &items {
                let outcome = self
                    .inventory
                    .decrement(&txn, &stock_line(item))
                    .await?;
                if outcome == StockOutcome::Depleted {
                    events.push(Event::StockDepleted {
                        product_id: item.product_id,
                        variation_id: item.variation_id,
                    });
                }
            }

            if let Some(redemption) = &redemptions.coupon {
                coupons::record_usage(&txn, redemption, order_id).await?;
                events.push(Event::CouponRedeemed {
                    coupon_id: redemption.coupon_id,
                    order_id,
                    discount_cents: redemption.discount_cents,
                });
            }
            if let Some((gift_card_id, amount_cents)) = redemptions.gift_card {
                let entry = gift_cards::redeem(&txn, gift_card_id, order_id, amount_cents).await?;
                events.push(Event::GiftCardRedeemed {
                    gift_card_id,
                    order_id,
                    amount_cents,
                    balance_after_cents: entry.balance_after_cents,
                });
            }
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        ORDERS_CREATED.inc();
        if payment_failed {
            FAILED_PAYMENT_ORDERS.inc();
            warn!(order_id = %order_id, "Payment failed; order recorded without stock changes or notifications");
        }
        info!(order_id = %order_id, order_number = %order.order_number, total_cents = order.total_cents, "Order created successfully");

        self.publish(Event::OrderCreated {
            order_id,
            total_cents: order.total_cents,
            payment_failed,
        });
        for event in events {
            self.publish(event);
        }

        if !payment_failed {
            self.notify_created(&order, &items).await;
        }

        Ok(OrderDetails {
            order,
            items,
            status_history: vec![history],
        })
    }

    async fn notify_created(&self, order: &OrderModel, items: &[order_item::Model]) {
        let contact = match customer_contact(&*self.db_pool, order).await {
            Ok(contact) => contact,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Could not resolve customer email");
                None
            }
        };
        let name = contact.as_ref().and_then(|c| c.name.clone());
        let summary = OrderSummary::new(order, items, name);

        match &contact {
            Some(contact) => self.notifier.dispatch(OrderNotification::Confirmation {
                to: contact.email.clone(),
                order: summary.clone(),
            }),
            None => warn!(order_id = %order.id, "No customer email; confirmation skipped"),
        }
        self.notifier.dispatch(OrderNotification::AdminNewOrder {
            to: self.admin_email.clone(),
            customer_email: contact.map(|c| c.email),
            shipping_address: order.shipping_address.clone(),
            order: summary,
        });
    }

    fn publish(&self, event: Event) {
        if let Some(event_sender) = &self.event_sender {
            event_sender.publish(event);
        }
    }
}

pub(crate) fn stock_line(item: &order_item::Model) -> StockLine {
    StockLine {
        product_id: item.product_id,
        variation_id: item.variation_id,
        product_type: item.product_type,
        quantity: item.quantity,
    }
}

/// Guest snapshot first, then the registered user's account.
pub(crate) async fn customer_contact<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
) -> Result<Option<CustomerContact>, ServiceError> {
    if let Some(guest) = order.guest() {
        return Ok(Some(CustomerContact {
            email: guest.email,
            name: Some(guest.name),
        }));
    }
    let Some(user_id) = order.user_id else {
        return Ok(None);
    };
    Ok(user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .map(|u| CustomerContact {
            email: u.email,
            name: Some(u.name),
        }))
}

pub(crate) async fn load_details<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> Result<OrderDetails, ServiceError> {
    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .order_by_asc(order_item::Column::Position)
        .all(conn)
        .await?;
    let status_history = order_status_history::Entity::find()
        .filter(order_status_history::Column::OrderId.eq(order.id))
        .order_by_asc(order_status_history::Column::Position)
        .all(conn)
        .await?;
    Ok(OrderDetails {
        order,
        items,
        status_history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn strict_totals_use_computed_amount() {
        assert_eq!(resolve_total(None, dec!(55), true).unwrap(), dec!(55.00));
        assert_eq!(resolve_total(Some(dec!(0)), dec!(55), true).unwrap(), dec!(55.00));
        assert_eq!(resolve_total(Some(dec!(55.01)), dec!(55), true).unwrap(), dec!(55.00));
        assert_matches!(
            resolve_total(Some(dec!(10)), dec!(55), true),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn legacy_totals_trust_positive_caller_amount() {
        assert_eq!(resolve_total(Some(dec!(10)), dec!(55), false).unwrap(), dec!(10));
        assert_eq!(resolve_total(Some(dec!(-3)), dec!(55), false).unwrap(), dec!(55));
    }

    #[test]
    fn order_numbers_are_prefixed_and_unique() {
        let a = generate_order_number();
        assert!(a.starts_with("ORD-"));
        assert_eq!(a.len(), "ORD-20240101-ABCDEF12".len());
        assert_ne!(a, generate_order_number());
    }

    #[test]
    fn create_request_accepts_legacy_shape() {
        let request: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "products": [
                {"productId": Uuid::new_v4(), "quantity": 2, "price": "12.50"},
                {"productId": Uuid::new_v4(), "variationId": Uuid::new_v4(), "productType": "variable", "quantity": 1, "price": 5}
            ],
            "guestCustomer": {"name": "Ada", "email": "ada@example.com", "phone": "555"},
            "payment_status": "FAILED",
            "shippingCost": "4.00"
        }))
        .unwrap();
        assert_eq!(request.payment_status, "FAILED");
        assert_eq!(request.subtotal().unwrap(), dec!(30.00));
        assert_matches!(request.check(), Ok(CustomerIdentity::Guest(_)));
    }

    #[test]
    fn oversized_lines_are_rejected_not_panicking() {
        let huge_quantity: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "products": [{"productId": Uuid::new_v4(), "quantity": 1000000000, "price": "1"}],
            "userId": Uuid::new_v4()
        }))
        .unwrap();
        assert_matches!(huge_quantity.check(), Err(ServiceError::ValidationError(_)));

        let huge_price: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "products": [{"productId": Uuid::new_v4(), "quantity": 1, "price": "79228162514264337593543950"}],
            "userId": Uuid::new_v4()
        }))
        .unwrap();
        assert_matches!(huge_price.check(), Err(ServiceError::InvalidInput(_)));

        let line = serde_json::json!({"productId": Uuid::new_v4(), "quantity": 1000000, "price": "1000000000000"});
        let many: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "products": vec![line; 100],
            "userId": Uuid::new_v4()
        }))
        .unwrap();
        assert_matches!(many.check(), Ok(_));
        let subtotal = many.subtotal().unwrap();
        assert_matches!(to_cents(subtotal), Err(ServiceError::InvalidInput(_)));
    }

    #[test]
    fn empty_products_rejected() {
        let request: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "products": [],
            "userId": Uuid::new_v4()
        }))
        .unwrap();
        assert_matches!(request.check(), Err(ServiceError::ValidationError(_)));
    }
}
