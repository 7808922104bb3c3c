//! Small helpers shared across the workspace.

pub mod formatting;

pub use formatting::{format_money, truncate_id};
