pub mod cart;
pub mod identity;
pub mod money;
pub mod status;

pub use cart::CartLine;
pub use identity::{CustomerIdentity, GuestCustomer};
pub use status::{LegacyOrderStatus, OrderStatus};
