#![allow(dead_code)]

use std::{str::FromStr, sync::Arc};

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use storefront_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{coupon, gift_card, product, product_variation, user},
    events::{self, EventSender},
    notifications::{NotificationDispatcher, OrderNotification},
    services::{
        catalog::{CreateProductRequest, CreateVariationRequest},
        coupons::CreateCouponRequest,
        gift_cards::IssueGiftCardRequest,
    },
    AppState,
};
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up an application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    notifications: Mutex<mpsc::Receiver<OrderNotification>>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
        configure(&mut cfg);

        // One connection: every connection to `sqlite::memory:` is its own database.
        let pool = db::establish_connection_with_config(&DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            sqlx_logging: false,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let (notifier, notification_rx) = NotificationDispatcher::channel(256);
        let state = AppState::new(Arc::new(pool), Arc::new(cfg), event_sender, notifier);
        let router = storefront_api::build_router(state.clone());

        Self {
            router,
            state,
            notifications: Mutex::new(notification_rx),
            _event_task: event_task,
        }
    }

    /// Send a JSON request through the full middleware stack.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Everything queued for delivery so far, oldest first.
    pub async fn drain_notifications(&self) -> Vec<OrderNotification> {
        let mut rx = self.notifications.lock().await;
        let mut out = Vec::new();
        while let Ok(notification) = rx.try_recv() {
            out.push(notification);
        }
        out
    }

    pub async fn seed_user(&self, name: &str, email: &str) -> user::Model {
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed user")
    }

    pub async fn seed_simple_product(&self, price: Decimal, stock: i64) -> product::Model {
        self.state
            .services
            .catalog
            .create_product(CreateProductRequest {
                name: format!("Simple {}", Uuid::new_v4().simple()),
                product_type: product::ProductType::Simple,
                vendor_id: None,
                category_ids: Vec::new(),
                price,
                on_sale: false,
                count_in_stock: stock,
                endless_stock: false,
            })
            .await
            .expect("seed simple product")
    }

    /// A simple product that never runs out; its stored stock stays at zero.
    pub async fn seed_endless_product(&self, price: Decimal) -> product::Model {
        self.state
            .services
            .catalog
            .create_product(CreateProductRequest {
                name: format!("Endless {}", Uuid::new_v4().simple()),
                product_type: product::ProductType::Simple,
                vendor_id: None,
                category_ids: Vec::new(),
                price,
                on_sale: false,
                count_in_stock: 0,
                endless_stock: true,
            })
            .await
            .expect("seed endless product")
    }

    pub async fn add_variation(&self, product_id: Uuid, request: Value) -> product_variation::Model {
        let request: CreateVariationRequest =
            serde_json::from_value(request).expect("variation request");
        self.state
            .services
            .catalog
            .add_variation(product_id, request)
            .await
            .expect("add variation")
    }

    /// A variable product with one active variation per entry in `stocks`.
    pub async fn seed_variable_product(
        &self,
        price: Decimal,
        stocks: &[i64],
    ) -> (product::Model, Vec<product_variation::Model>) {
        let catalog = &self.state.services.catalog;
        let product = catalog
            .create_product(
                serde_json::from_value(serde_json::json!({
                    "name": format!("Variable {}", Uuid::new_v4().simple()),
                    "productType": "variable",
                    "price": price,
                }))
                .expect("variable product request"),
            )
            .await
            .expect("seed variable product");

        let mut variations = Vec::new();
        for (i, stock) in stocks.iter().enumerate() {
            let request: CreateVariationRequest = serde_json::from_value(serde_json::json!({
                "name": format!("Size {}", i),
                "price": price,
                "stock": stock,
            }))
            .expect("variation request");
            variations.push(
                catalog
                    .add_variation(product.id, request)
                    .await
                    .expect("seed variation"),
            );
        }
        (self.product(product.id).await, variations)
    }

    pub async fn seed_coupon(&self, request: Value) -> coupon::Model {
        let request: CreateCouponRequest =
            serde_json::from_value(request).expect("coupon request");
        self.state
            .services
            .coupons
            .create_coupon(request)
            .await
            .expect("seed coupon")
    }

    pub async fn seed_gift_card(&self, code: &str, balance: Decimal) -> gift_card::Model {
        let request: IssueGiftCardRequest = serde_json::from_value(serde_json::json!({
            "code": code,
            "initialBalance": balance,
        }))
        .expect("gift card request");
        self.state
            .services
            .gift_cards
            .issue(request)
            .await
            .expect("seed gift card")
    }

    pub async fn product(&self, id: Uuid) -> product::Model {
        product::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("load product")
            .expect("product exists")
    }

    pub async fn variation(&self, id: Uuid) -> product_variation::Model {
        product_variation::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("load variation")
            .expect("variation exists")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Reads a decimal rendered either as a JSON string or number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}

pub fn guest() -> Value {
    serde_json::json!({
        "name": "Grace Hopper",
        "email": "grace@example.com",
        "phone": "+1 555 0100"
    })
}
