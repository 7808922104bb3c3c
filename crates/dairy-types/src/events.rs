//! Event types published by the order lifecycle engine.
//!
//! Events flow through the engine's event bus so that other parts of the
//! service (logging, future notification hooks) can react to order changes
//! without coupling to the engine internals.

use crate::{OrderStatus, Role};
use serde::{Deserialize, Serialize};

/// Main event type for order changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OrderEvent {
	/// A new order has been placed.
	Created {
		order_id: String,
		order_number: String,
		customer_id: String,
	},
	/// An order has been bound to a delivery person.
	Assigned {
		order_id: String,
		delivery_id: String,
	},
	/// An admin moved an order to another delivery person.
	Reassigned {
		order_id: String,
		from: String,
		to: String,
	},
	/// An order moved along a lifecycle edge.
	StatusChanged {
		order_id: String,
		from: OrderStatus,
		to: OrderStatus,
		actor_role: Role,
	},
	/// An order has been cancelled.
	Cancelled {
		order_id: String,
		requested_by: String,
	},
}

impl OrderEvent {
	/// Identifier of the order the event refers to.
	pub fn order_id(&self) -> &str {
		match self {
			OrderEvent::Created { order_id, .. }
			| OrderEvent::Assigned { order_id, .. }
			| OrderEvent::Reassigned { order_id, .. }
			| OrderEvent::StatusChanged { order_id, .. }
			| OrderEvent::Cancelled { order_id, .. } => order_id,
		}
	}
}
