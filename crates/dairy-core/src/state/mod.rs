//! Persistent domain state: orders, users and products.

pub mod lifecycle;
pub mod order;
pub mod product;
pub mod user;

pub use order::OrderStore;
pub use product::ProductCatalog;
pub use user::UserDirectory;
