//! Core order lifecycle engine for the dairy delivery service.
//!
//! Orders are created by customers, assigned by admins to active delivery
//! personnel, and walked through Pending, Processing, Shipped and Delivered
//! (or Cancelled). Stats are derived from the order store on demand.

pub mod builder;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod state;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{BuilderError, DairyBuilder, DairyFactories};
pub use engine::{event_bus::EventBus, DairyEngine};
pub use error::{require_role, LifecycleError};
pub use handlers::{AssignmentHandler, TransitionHandler};
pub use state::{OrderStore, ProductCatalog, UserDirectory};
pub use stats::StatsAggregator;
