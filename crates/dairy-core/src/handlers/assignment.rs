//! Assignment engine.
//!
//! An order is assigned at most once, while Pending. Assignment and status
//! changes share the order's lock, so of two racing writers exactly one wins
//! and the other sees the updated order.

use crate::error::require_role;
use crate::state::OrderStore;
use crate::LifecycleError;
use dairy_types::{truncate_id, Actor, Order, OrderEvent, OrderStatus, Role};
use std::sync::Arc;
use tracing::instrument;

pub struct AssignmentHandler {
	orders: Arc<OrderStore>,
}

impl AssignmentHandler {
	pub fn new(orders: Arc<OrderStore>) -> Self {
		Self { orders }
	}

	/// Assigns a Pending, unassigned order to an active delivery person and
	/// moves it to Processing. Not idempotent.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), delivery_id = %delivery_id))]
	pub async fn assign(
		&self,
		actor: &Actor,
		order_id: &str,
		delivery_id: &str,
	) -> Result<Order, LifecycleError> {
		require_role(actor, &[Role::Admin])?;

		let (order, courier) = self
			.orders
			.update_order_for_courier(order_id, delivery_id, |order, courier| {
				if order.status != OrderStatus::Pending {
					return Err(LifecycleError::InvalidState(format!(
						"order {} is {}, only Pending orders can be assigned",
						order.order_number, order.status
					)));
				}
				if let Some(current) = &order.assigned_delivery_id {
					return Err(LifecycleError::InvalidState(format!(
						"order {} is already assigned to {}",
						order.order_number, current
					)));
				}
				order.assigned_delivery_id = Some(courier.id.clone());
				order.status = OrderStatus::Processing;
				Ok(())
			})
			.await?;

		tracing::info!(
			order_number = %order.order_number,
			courier = %courier.username,
			"Order assigned"
		);
		self.orders.publish(OrderEvent::Assigned {
			order_id: order.id.clone(),
			delivery_id: courier.id,
		});
		Ok(order)
	}

	/// Moves an assigned, non-terminal order to another active delivery
	/// person. Status is left unchanged.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), delivery_id = %delivery_id))]
	pub async fn reassign(
		&self,
		actor: &Actor,
		order_id: &str,
		delivery_id: &str,
	) -> Result<Order, LifecycleError> {
		require_role(actor, &[Role::Admin])?;

		let mut previous = String::new();
		let (order, courier) = self
			.orders
			.update_order_for_courier(order_id, delivery_id, |order, courier| {
				if order.status.is_terminal() {
					return Err(LifecycleError::InvalidState(format!(
						"order {} is {} and cannot be reassigned",
						order.order_number, order.status
					)));
				}
				let Some(current) = order.assigned_delivery_id.clone() else {
					return Err(LifecycleError::InvalidState(format!(
						"order {} is not assigned yet",
						order.order_number
					)));
				};
				if current == courier.id {
					return Err(LifecycleError::InvalidState(format!(
						"order {} is already assigned to {}",
						order.order_number, current
					)));
				}
				order.assigned_delivery_id = Some(courier.id.clone());
				previous = current;
				Ok(())
			})
			.await?;

		tracing::info!(
			order_number = %order.order_number,
			from = %previous,
			to = %courier.id,
			"Order reassigned"
		);
		self.orders.publish(OrderEvent::Reassigned {
			order_id: order.id.clone(),
			from: previous,
			to: courier.id,
		});
		Ok(order)
	}
}
