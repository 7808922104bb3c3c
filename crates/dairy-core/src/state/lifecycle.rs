//! Order lifecycle graph and the role rules for walking it.
//!
//! Pending -> Confirmed | Cancelled, Confirmed -> Processing | Cancelled,
//! Processing -> Shipped | Cancelled, Shipped -> Delivered. Delivered and
//! Cancelled are terminal. Assignment moves Pending -> Processing on its own
//! path and is not an edge of this graph.

use crate::LifecycleError;
use dairy_types::{Actor, Order, OrderStatus, Role};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	use OrderStatus::*;

	let mut m = HashMap::new();
	m.insert(Pending, HashSet::from([Confirmed, Cancelled]));
	m.insert(Confirmed, HashSet::from([Processing, Cancelled]));
	m.insert(Processing, HashSet::from([Shipped, Cancelled]));
	m.insert(Shipped, HashSet::from([Delivered]));
	m.insert(Delivered, HashSet::new()); // terminal
	m.insert(Cancelled, HashSet::new()); // terminal
	m
});

/// Checks if `to` is a direct successor of `from`.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
	TRANSITIONS
		.get(&from)
		.is_some_and(|set| set.contains(&to))
}

/// Checks that `actor` may move `order` to `to`.
///
/// Assumes the edge itself is legal.
pub fn authorize(actor: &Actor, order: &Order, to: OrderStatus) -> Result<(), LifecycleError> {
	let allowed = match actor.role {
		Role::Admin => true,
		Role::Delivery => {
			matches!(
				(order.status, to),
				(OrderStatus::Processing, OrderStatus::Shipped)
					| (OrderStatus::Shipped, OrderStatus::Delivered)
			) && order.is_assigned_to(&actor.id)
		},
		Role::Customer => {
			order.status == OrderStatus::Pending
				&& to == OrderStatus::Cancelled
				&& order.customer_id == actor.id
		},
	};

	if allowed {
		Ok(())
	} else {
		Err(LifecycleError::Authorization(format!(
			"{} {} may not move order {} from {} to {}",
			actor.role, actor.id, order.order_number, order.status, to
		)))
	}
}

/// Checks that `actor` may see `order` at all.
pub fn can_view(actor: &Actor, order: &Order) -> bool {
	match actor.role {
		Role::Admin => true,
		Role::Customer => order.customer_id == actor.id,
		Role::Delivery => order.is_assigned_to(&actor.id),
	}
}
