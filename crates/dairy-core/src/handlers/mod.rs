//! Handlers that drive orders through the lifecycle.

pub mod assignment;
pub mod transition;

pub use assignment::AssignmentHandler;
pub use transition::TransitionHandler;
