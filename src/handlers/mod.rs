pub mod common;
pub mod coupons;
pub mod discounts;
pub mod extract;
pub mod gift_cards;
pub mod health;
pub mod orders;
pub mod products;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
