use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    notifications::NotificationDispatcher,
    services::{
        catalog::CatalogService, coupons::CouponService, discounts::DiscountService,
        gift_cards::GiftCardService, inventory::InventoryService,
        order_status::OrderStatusService, orders::OrderService,
    },
};

/// Builds services over shared dependencies.
pub struct ServiceFactory {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    notifier: NotificationDispatcher,
    config: Arc<AppConfig>,
}

impl ServiceFactory {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        notifier: NotificationDispatcher,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            notifier,
            config,
        }
    }

    pub fn inventory_service(&self) -> InventoryService {
        InventoryService::new(self.config.stock_policy)
    }

    pub fn discount_service(&self) -> DiscountService {
        DiscountService::new(self.db_pool.clone(), self.config.discounts.clone())
    }

    pub fn order_service(&self) -> OrderService {
        OrderService::new(
            self.db_pool.clone(),
            Some(Arc::new(self.event_sender.clone())),
            self.notifier.clone(),
            self.discount_service(),
            self.config.settlement(),
            self.config.admin_notification_email.clone(),
        )
    }

    pub fn order_status_service(&self) -> OrderStatusService {
        OrderStatusService::new(
            self.db_pool.clone(),
            Some(Arc::new(self.event_sender.clone())),
            self.notifier.clone(),
            self.inventory_service(),
        )
    }

    pub fn db_pool(&self) -> &Arc<DbPool> {
        &self.db_pool
    }
}

/// Every service the HTTP layer calls, built once at startup.
#[derive(Clone)]
pub struct ServiceContainer {
    pub catalog: Arc<CatalogService>,
    pub coupons: Arc<CouponService>,
    pub gift_cards: Arc<GiftCardService>,
    pub discounts: Arc<DiscountService>,
    pub orders: Arc<OrderService>,
    pub order_status: Arc<OrderStatusService>,
}

impl ServiceContainer {
    pub fn new(factory: &ServiceFactory) -> Self {
        let db = factory.db_pool().clone();
        Self {
            catalog: Arc::new(CatalogService::new(db.clone())),
            coupons: Arc::new(CouponService::new(db.clone())),
            gift_cards: Arc::new(GiftCardService::new(
                db,
                factory.config.default_currency.clone(),
            )),
            discounts: Arc::new(factory.discount_service()),
            orders: Arc::new(factory.order_service()),
            order_status: Arc::new(factory.order_status_service()),
        }
    }
}
