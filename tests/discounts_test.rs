//! Discount resolution with coupons, gift cards and automatic rules read from the database.

mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use common::{guest, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::{
    errors::ServiceError,
    services::{
        discounts::{AutomaticDiscountKind, CalculateDiscountsRequest, ValidateCouponRequest},
        orders::CheckoutRequest,
    },
};
use uuid::Uuid;

fn cart(items: serde_json::Value) -> serde_json::Value {
    json!({ "cartItems": items })
}

fn calc(value: serde_json::Value) -> CalculateDiscountsRequest {
    serde_json::from_value(value).expect("discount request")
}

#[tokio::test]
async fn rejected_codes_are_reported_not_raised() {
    let app = TestApp::new().await;
    let mut request = cart(json!([{"productId": Uuid::new_v4(), "quantity": 1, "price": "50.00"}]));
    request["couponCode"] = json!("GHOST");
    request["giftCardCode"] = json!("NO-SUCH-CARD");

    let breakdown = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(request))
        .await
        .expect("breakdown");

    assert_eq!(breakdown.coupon_error.as_ref().map(|e| e.kind), Some("not_found"));
    assert_eq!(breakdown.gift_card_error.as_ref().map(|e| e.kind), Some("not_found"));
    assert_eq!(breakdown.total_discount, dec!(0));
    assert_eq!(breakdown.final_total, dec!(50.00));
}

#[tokio::test]
async fn category_scoped_coupon_discounts_only_matching_lines() {
    let app = TestApp::new().await;
    let shoes = Uuid::new_v4();
    let in_scope = app
        .state
        .services
        .catalog
        .create_product(
            serde_json::from_value(json!({
                "name": "Runner",
                "price": "40.00",
                "countInStock": 5,
                "categoryIds": [shoes]
            }))
            .unwrap(),
        )
        .await
        .unwrap();
    let other = app.seed_simple_product(dec!(30.00), 5).await;
    app.seed_coupon(json!({
        "code": "SHOES25",
        "discountType": "percentage",
        "discountAmount": "25",
        "categoryIds": [shoes]
    }))
    .await;

    let mut request = cart(json!([
        {"productId": in_scope.id, "quantity": 1, "price": "40.00"},
        {"productId": other.id, "quantity": 1, "price": "30.00"}
    ]));
    request["couponCode"] = json!("shoes25");
    let breakdown = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(request))
        .await
        .unwrap();

    assert_eq!(breakdown.coupon_discount, dec!(10.00));
    assert_eq!(breakdown.final_total, dec!(60.00));
}

#[tokio::test]
async fn first_order_discount_stops_after_a_paid_order() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ada Lovelace", "ada@example.com").await;
    let product = app.seed_simple_product(dec!(20.00), 10).await;
    let mut request = cart(json!([{"productId": product.id, "quantity": 1, "price": "20.00"}]));
    request["userId"] = json!(user.id);

    let before = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(request.clone()))
        .await
        .unwrap();
    assert!(before
        .automatic_discounts
        .iter()
        .any(|d| d.kind == AutomaticDiscountKind::FirstOrder && d.amount == dec!(2.00)));

    let order: CheckoutRequest = serde_json::from_value(json!({
        "products": [{"productId": product.id, "quantity": 1, "price": "20.00"}],
        "userId": user.id,
        "paymentStatus": "Paid"
    }))
    .unwrap();
    app.state.services.orders.checkout(order).await.unwrap();

    let after = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(request))
        .await
        .unwrap();
    assert!(after.automatic_discounts.is_empty());
}

#[tokio::test]
async fn per_customer_limit_counts_guest_redemptions_by_email() {
    let app = TestApp::new().await;
    let product = app.seed_simple_product(dec!(20.00), 10).await;
    app.seed_coupon(json!({
        "code": "WELCOME",
        "discountType": "fixed_cart",
        "discountAmount": "5",
        "usageLimitPerUser": 1
    }))
    .await;

    let order: CheckoutRequest = serde_json::from_value(json!({
        "products": [{"productId": product.id, "quantity": 1, "price": "20.00"}],
        "guestCustomer": guest(),
        "paymentStatus": "paid",
        "couponCode": "WELCOME"
    }))
    .unwrap();
    app.state.services.orders.checkout(order).await.unwrap();

    let mut request = cart(json!([{"productId": product.id, "quantity": 1, "price": "20.00"}]));
    request["couponCode"] = json!("WELCOME");
    request["userEmail"] = json!("Grace@Example.com");
    let breakdown = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(request.clone()))
        .await
        .unwrap();
    assert_eq!(
        breakdown.coupon_error.map(|e| e.kind),
        Some("per_user_limit_reached")
    );

    request["userEmail"] = json!("someone.else@example.com");
    let breakdown = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(request))
        .await
        .unwrap();
    assert_eq!(breakdown.coupon_discount, dec!(5.00));
}

#[tokio::test]
async fn email_restricted_coupon_needs_a_listed_address() {
    let app = TestApp::new().await;
    app.seed_coupon(json!({
        "code": "VIP",
        "discountType": "percentage",
        "discountAmount": "20",
        "allowedEmails": ["VIP@example.com"]
    }))
    .await;
    let items = json!([{"productId": Uuid::new_v4(), "quantity": 1, "price": "50.00"}]);

    let mut anonymous = cart(items.clone());
    anonymous["couponCode"] = json!("VIP");
    let breakdown = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(anonymous))
        .await
        .unwrap();
    assert_eq!(breakdown.coupon_error.map(|e| e.kind), Some("email_not_allowed"));

    let mut listed = cart(items);
    listed["couponCode"] = json!("VIP");
    listed["userEmail"] = json!("vip@example.com");
    let breakdown = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(listed))
        .await
        .unwrap();
    assert_eq!(breakdown.coupon_discount, dec!(10.00));
}

#[tokio::test]
async fn expired_and_future_coupons_are_rejected() {
    let app = TestApp::new().await;
    app.seed_coupon(json!({
        "code": "OLD",
        "discountType": "fixed_cart",
        "discountAmount": "5",
        "startDate": Utc::now() - Duration::days(10),
        "endDate": Utc::now() - Duration::days(1)
    }))
    .await;
    app.seed_coupon(json!({
        "code": "SOON",
        "discountType": "fixed_cart",
        "discountAmount": "5",
        "startDate": Utc::now() + Duration::days(1)
    }))
    .await;

    for (code, kind) in [("OLD", "expired"), ("SOON", "not_started")] {
        let mut request = cart(json!([{"productId": Uuid::new_v4(), "quantity": 1, "price": "50.00"}]));
        request["couponCode"] = json!(code);
        let breakdown = app
            .state
            .services
            .discounts
            .calculate_discounts(&calc(request))
            .await
            .unwrap();
        assert_eq!(breakdown.coupon_error.map(|e| e.kind), Some(kind), "{code}");
    }
}

#[tokio::test]
async fn bound_gift_card_only_serves_its_owner() {
    let app = TestApp::new().await;
    let owner = app.seed_user("Owner", "owner@example.com").await;
    app.state
        .services
        .gift_cards
        .issue(
            serde_json::from_value(json!({
                "code": "OWNED-CARD",
                "initialBalance": "25.00",
                "boundUserId": owner.id
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    let items = json!([{"productId": Uuid::new_v4(), "quantity": 1, "price": "40.00"}]);
    let mut stranger = cart(items.clone());
    stranger["giftCardCode"] = json!("owned-card");
    let breakdown = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(stranger))
        .await
        .unwrap();
    assert_eq!(breakdown.gift_card_error.map(|e| e.kind), Some("not_owner"));

    let mut mine = cart(items);
    mine["giftCardCode"] = json!("OWNEDCARD");
    mine["userId"] = json!(owner.id);
    let breakdown = app
        .state
        .services
        .discounts
        .calculate_discounts(&calc(mine))
        .await
        .unwrap();
    assert_eq!(breakdown.gift_card_discount, dec!(25.00));
}

#[tokio::test]
async fn top_up_revives_a_spent_card_and_keeps_the_ledger_balanced() {
    let app = TestApp::new().await;
    let product = app.seed_simple_product(dec!(10.00), 10).await;
    app.seed_gift_card("SPEND-ME", dec!(10.00)).await;

    let order: CheckoutRequest = serde_json::from_value(json!({
        "products": [{"productId": product.id, "quantity": 1, "price": "10.00"}],
        "guestCustomer": guest(),
        "paymentStatus": "paid",
        "giftCardCode": "SPEND-ME"
    }))
    .unwrap();
    let result = app.state.services.orders.checkout(order).await.unwrap();
    assert_eq!(result.order.order.total_cents, 0);

    let gift_cards = &app.state.services.gift_cards;
    assert!(gift_cards.get_balance("SPEND-ME").await.unwrap().is_redeemed);
    gift_cards.top_up("spend-me", dec!(15.00)).await.unwrap();
    let balance = gift_cards.get_balance("SPENDME").await.unwrap();
    assert_eq!(balance.current_balance, dec!(15.00));
    assert!(!balance.is_redeemed);

    let ledger = gift_cards.transactions("SPEND-ME").await.unwrap();
    assert_eq!(ledger.len(), 2);
    for entry in &ledger {
        assert_eq!(
            entry.balance_after_cents,
            entry.balance_before_cents - entry.amount_cents
        );
    }
    assert_eq!(ledger[1].amount_cents, -1500);
}

#[tokio::test]
async fn validate_coupon_reports_eligibility_without_redeeming() {
    let app = TestApp::new().await;
    app.seed_coupon(json!({
        "code": "TENOFF",
        "discountType": "fixed_cart",
        "discountAmount": "10",
        "minimumAmount": "50",
        "freeShipping": true
    }))
    .await;
    let discounts = &app.state.services.discounts;

    let small: ValidateCouponRequest = serde_json::from_value(json!({
        "code": "tenoff",
        "cartItems": [{"productId": Uuid::new_v4(), "quantity": 1, "price": "20.00"}]
    }))
    .unwrap();
    let verdict = discounts.validate_coupon(small).await.unwrap();
    assert!(!verdict.valid);
    assert_eq!(verdict.error.map(|e| e.kind), Some("minimum_not_met"));

    let big: ValidateCouponRequest = serde_json::from_value(json!({
        "code": "TENOFF",
        "cartItems": [{"productId": Uuid::new_v4(), "quantity": 2, "price": "40.00"}]
    }))
    .unwrap();
    let verdict = discounts.validate_coupon(big).await.unwrap();
    assert!(verdict.valid);
    assert_eq!(verdict.discount, dec!(10.00));
    assert!(verdict.free_shipping);

    let coupon = app
        .state
        .services
        .coupons
        .find_by_code("TENOFF")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon.usage_count, 0);
}

#[tokio::test]
async fn negative_line_prices_are_rejected() {
    let app = TestApp::new().await;
    let discounts = &app.state.services.discounts;

    let mut request = cart(json!([
        {"productId": Uuid::new_v4(), "quantity": 1, "price": "50.00"},
        {"productId": Uuid::new_v4(), "quantity": 2, "price": "-40.00"}
    ]));
    request["userId"] = json!(Uuid::new_v4());
    assert_matches!(
        discounts.calculate_discounts(&calc(request)).await,
        Err(ServiceError::InvalidInput(_))
    );

    let verdict: ValidateCouponRequest = serde_json::from_value(json!({
        "code": "ANY",
        "cartItems": [{"productId": Uuid::new_v4(), "quantity": 1, "price": "-1"}]
    }))
    .unwrap();
    assert_matches!(
        discounts.validate_coupon(verdict).await,
        Err(ServiceError::InvalidInput(_))
    );
}

#[tokio::test]
async fn oversized_carts_fail_with_client_errors() {
    let app = TestApp::new().await;
    let discounts = &app.state.services.discounts;

    let quantity = cart(json!([{"productId": Uuid::new_v4(), "quantity": 1000000000, "price": "1"}]));
    assert_matches!(
        discounts.calculate_discounts(&calc(quantity)).await,
        Err(ServiceError::ValidationError(_))
    );

    let price = cart(json!([{"productId": Uuid::new_v4(), "quantity": 1, "price": "79228162514264337593543950"}]));
    assert_matches!(
        discounts.calculate_discounts(&calc(price)).await,
        Err(ServiceError::InvalidInput(_))
    );

    let mut total = cart(json!([{"productId": Uuid::new_v4(), "quantity": 1, "price": "10"}]));
    total["cartTotal"] = json!("79228162514264337593543950");
    assert_matches!(
        discounts.calculate_discounts(&calc(total)).await,
        Err(ServiceError::InvalidInput(_))
    );
}
