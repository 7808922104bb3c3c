//! Common types for the dairy delivery service.
//!
//! This crate defines the domain entities (orders, users, products), the
//! read-model types produced by the stats aggregator, and the shared plumbing
//! types (storage keys, backend registries, configuration schemas, API
//! errors) used throughout the workspace.

/// API request/response types and the structured API error.
pub mod api;
/// Event types published when orders change.
pub mod events;
/// Orders, order items and lifecycle status.
pub mod order;
/// Catalog products.
pub mod product;
/// Registry trait for self-registering backends.
pub mod registry;
/// Stats windows and read-model types.
pub mod stats;
/// Storage collection keys.
pub mod storage;
/// Users, roles and the acting identity.
pub mod user;
/// Formatting helpers.
pub mod utils;
/// Configuration validation types for backend sections.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use events::*;
pub use order::*;
pub use product::*;
pub use registry::*;
pub use stats::*;
pub use storage::*;
pub use user::*;
pub use utils::{format_money, truncate_id};
pub use validation::*;

pub use rust_decimal::Decimal;
