// Discount catalog administration
pub mod coupons;
pub mod gift_cards;

// Discount resolution
pub mod discounts;

// Settlement and lifecycle
pub mod inventory;
pub mod order_status;
pub mod orders;

// Products the inventory draws from
pub mod catalog;

// Service factory for dependency injection
pub mod factory;
