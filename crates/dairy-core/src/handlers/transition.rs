//! Status transition engine.

use crate::state::lifecycle::{authorize, is_valid_transition};
use crate::state::OrderStore;
use crate::LifecycleError;
use chrono::Utc;
use dairy_types::{truncate_id, Actor, Order, OrderEvent, OrderStatus};
use std::sync::Arc;
use tracing::instrument;

/// Validates and applies status changes against the lifecycle graph.
pub struct TransitionHandler {
	orders: Arc<OrderStore>,
}

impl TransitionHandler {
	pub fn new(orders: Arc<OrderStore>) -> Self {
		Self { orders }
	}

	/// Moves an order to `target` on behalf of `actor`.
	///
	/// Fails with `InvalidTransition` when `target` is not a direct successor
	/// and with `Authorization` when the actor's role does not allow the edge.
	/// Entering Delivered stamps `delivery_completed_at`; entering Cancelled
	/// keeps any assignment as history.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), target = %target))]
	pub async fn transition(
		&self,
		order_id: &str,
		target: OrderStatus,
		actor: &Actor,
	) -> Result<Order, LifecycleError> {
		let mut previous = None;
		let order = self
			.orders
			.update_order_with(order_id, |order| {
				if !is_valid_transition(order.status, target) {
					return Err(LifecycleError::InvalidTransition {
						from: order.status,
						to: target,
					});
				}
				authorize(actor, order, target)?;

				previous = Some(order.status);
				order.status = target;
				if target == OrderStatus::Delivered {
					order.delivery_completed_at = Some(Utc::now());
				}
				Ok(())
			})
			.await?;

		let from = previous.unwrap_or(target);
		tracing::info!(
			order_number = %order.order_number,
			from = %from,
			to = %target,
			actor = %actor.role,
			"Order status changed"
		);
		self.orders.publish(OrderEvent::StatusChanged {
			order_id: order.id.clone(),
			from,
			to: target,
			actor_role: actor.role,
		});

		Ok(order)
	}
}
