//! Order store.
//!
//! Owns order creation, lookup and every mutation. Mutations go through
//! [`OrderStore::update_order_with`], which holds a per-order lock across
//! read, validate and write so two writers never both succeed against the
//! same (status, assignment) pair.

use super::lifecycle;
use super::user::UserDirectory;
use crate::engine::event_bus::EventBus;
use crate::LifecycleError;
use chrono::Utc;
use dairy_storage::StorageService;
use dairy_types::{
	format_money, truncate_id, Actor, Decimal, NewOrder, Order, OrderEvent, OrderFilter, OrderItem,
	OrderStatus, Role, StorageKey, User,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

/// Persistent collection of orders.
pub struct OrderStore {
	storage: Arc<StorageService>,
	users: Arc<UserDirectory>,
	event_bus: EventBus,
	delivery_charge: Decimal,
	/// One mutex per order id.
	locks: DashMap<String, Arc<Mutex<()>>>,
	/// Serializes order-number reservation.
	number_lock: Mutex<()>,
}

impl OrderStore {
	pub fn new(
		storage: Arc<StorageService>,
		users: Arc<UserDirectory>,
		event_bus: EventBus,
		delivery_charge: Decimal,
	) -> Self {
		Self {
			storage,
			users,
			event_bus,
			delivery_charge,
			locks: DashMap::new(),
			number_lock: Mutex::new(()),
		}
	}

	pub fn delivery_charge(&self) -> Decimal {
		self.delivery_charge
	}

	fn validate(new_order: &NewOrder) -> Result<(), LifecycleError> {
		if new_order.items.is_empty() {
			return Err(LifecycleError::Validation(
				"an order needs at least one item".into(),
			));
		}
		for item in &new_order.items {
			if item.quantity < 1 {
				return Err(LifecycleError::Validation(format!(
					"quantity for {} must be at least 1",
					item.product_name
				)));
			}
			if item.unit_price < Decimal::ZERO {
				return Err(LifecycleError::Validation(format!(
					"unit price for {} cannot be negative",
					item.product_name
				)));
			}
		}
		if new_order.delivery_location.trim().is_empty() {
			return Err(LifecycleError::Validation(
				"delivery location cannot be blank".into(),
			));
		}
		Ok(())
	}

	/// Creates a Pending order for an existing customer.
	///
	/// Line totals, subtotal and total are computed here and never change
	/// afterwards.
	#[instrument(skip_all, fields(customer_id = %new_order.customer_id))]
	pub async fn create_order(&self, new_order: NewOrder) -> Result<Order, LifecycleError> {
		Self::validate(&new_order)?;

		let customer = self.users.get(&new_order.customer_id).await?;
		if customer.role != Role::Customer {
			return Err(LifecycleError::Validation(format!(
				"user {} is not a customer",
				customer.id
			)));
		}

		let items: Vec<OrderItem> = new_order
			.items
			.into_iter()
			.map(|draft| OrderItem {
				line_total: draft.unit_price * Decimal::from(draft.quantity),
				product_id: draft.product_id,
				product_name: draft.product_name,
				quantity: draft.quantity,
				unit_price: draft.unit_price,
			})
			.collect();
		let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();

		let id = Uuid::new_v4().to_string();
		let order_number = self.reserve_order_number(&id).await?;
		let now = Utc::now();

		let order = Order {
			id,
			order_number,
			customer_id: customer.id,
			items,
			subtotal,
			delivery_charge: self.delivery_charge,
			total_price: subtotal + self.delivery_charge,
			status: OrderStatus::Pending,
			assigned_delivery_id: None,
			delivery_location: new_order.delivery_location.trim().to_string(),
			delivery_instructions: new_order
				.delivery_instructions
				.filter(|text| !text.trim().is_empty()),
			payment_method: new_order.payment_method,
			payment_status: new_order.payment_method.initial_status(),
			created_at: now,
			updated_at: now,
			delivery_completed_at: None,
		};

		self.storage
			.store(StorageKey::Orders.as_str(), &order.id, &order)
			.await?;

		tracing::info!(
			order_id = %truncate_id(&order.id),
			order_number = %order.order_number,
			total = %format_money(order.total_price),
			"Order created"
		);
		self.publish(OrderEvent::Created {
			order_id: order.id.clone(),
			order_number: order.order_number.clone(),
			customer_id: order.customer_id.clone(),
		});

		Ok(order)
	}

	fn generate_order_number() -> String {
		let hex = Uuid::new_v4().simple().to_string();
		format!("ORD-{}", hex[..8].to_uppercase())
	}

	/// Picks an unused order number and records it against `order_id`.
	async fn reserve_order_number(&self, order_id: &str) -> Result<String, LifecycleError> {
		let _guard = self.number_lock.lock().await;
		loop {
			let candidate = Self::generate_order_number();
			if !self
				.storage
				.exists(StorageKey::OrderNumbers.as_str(), &candidate)
				.await?
			{
				self.storage
					.store(StorageKey::OrderNumbers.as_str(), &candidate, &order_id)
					.await?;
				return Ok(candidate);
			}
			tracing::debug!(order_number = %candidate, "Order number collision, retrying");
		}
	}

	pub async fn get_order(&self, id: &str) -> Result<Order, LifecycleError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), id)
			.await
			.map_err(|e| LifecycleError::from_lookup("Order", id, e))
	}

	/// Gets an order on behalf of `actor`, who must be allowed to see it.
	pub async fn get_order_for(&self, actor: &Actor, id: &str) -> Result<Order, LifecycleError> {
		let order = self.get_order(id).await?;
		if !lifecycle::can_view(actor, &order) {
			return Err(LifecycleError::Authorization(format!(
				"order {} is not visible to {} {}",
				order.order_number, actor.role, actor.id
			)));
		}
		Ok(order)
	}

	/// Lists orders matching `filter`, newest first.
	pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, LifecycleError> {
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all(StorageKey::Orders.as_str())
			.await?;
		orders.retain(|order| filter.matches(order));
		orders.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| b.order_number.cmp(&a.order_number))
		});
		Ok(orders)
	}

	/// Cancels a Pending order.
	///
	/// Admins may cancel any Pending order, customers only their own.
	#[instrument(skip_all, fields(order_id = %truncate_id(id)))]
	pub async fn cancel_order(
		&self,
		id: &str,
		requested_by: &Actor,
	) -> Result<Order, LifecycleError> {
		let order = self
			.update_order_with(id, |order| {
				let permitted = match requested_by.role {
					Role::Admin => true,
					Role::Customer => order.customer_id == requested_by.id,
					Role::Delivery => false,
				};
				if !permitted {
					return Err(LifecycleError::Authorization(format!(
						"{} {} may not cancel order {}",
						requested_by.role, requested_by.id, order.order_number
					)));
				}
				if order.status != OrderStatus::Pending {
					return Err(LifecycleError::InvalidTransition {
						from: order.status,
						to: OrderStatus::Cancelled,
					});
				}
				order.status = OrderStatus::Cancelled;
				Ok(())
			})
			.await?;

		tracing::info!(order_number = %order.order_number, "Order cancelled");
		self.publish(OrderEvent::Cancelled {
			order_id: order.id.clone(),
			requested_by: requested_by.id.clone(),
		});
		Ok(order)
	}

	/// Applies `updater` to an order under its lock and persists the result.
	///
	/// Nothing is written when `updater` fails. `updated_at` is refreshed on
	/// every successful update.
	pub(crate) async fn update_order_with<F>(
		&self,
		order_id: &str,
		updater: F,
	) -> Result<Order, LifecycleError>
	where
		F: FnOnce(&mut Order) -> Result<(), LifecycleError>,
	{
		let lock = self.lock_for(order_id);
		let result = {
			let _guard = lock.lock().await;
			match self.get_order(order_id).await {
				Ok(order) => self.apply(order, updater).await,
				Err(e) => Err(e),
			}
		};
		self.release_lock(order_id, lock);
		result
	}

	/// Like [`Self::update_order_with`], but resolves `courier_id` to an
	/// active delivery person while both the order lock and the roster lock
	/// are held, so a courier deactivated in the meantime is never handed
	/// the order.
	pub(crate) async fn update_order_for_courier<F>(
		&self,
		order_id: &str,
		courier_id: &str,
		updater: F,
	) -> Result<(Order, User), LifecycleError>
	where
		F: FnOnce(&mut Order, &User) -> Result<(), LifecycleError>,
	{
		let lock = self.lock_for(order_id);
		let result = {
			let _guard = lock.lock().await;
			// Order lock first, roster second. Roster writers never take an
			// order lock.
			let _roster = self.users.lock_roster().await;
			self.courier_update(order_id, courier_id, updater).await
		};
		self.release_lock(order_id, lock);
		result
	}

	async fn courier_update<F>(
		&self,
		order_id: &str,
		courier_id: &str,
		updater: F,
	) -> Result<(Order, User), LifecycleError>
	where
		F: FnOnce(&mut Order, &User) -> Result<(), LifecycleError>,
	{
		let order = self.get_order(order_id).await?;
		let courier = self.users.active_courier(courier_id).await?;
		let order = self
			.apply(order, |order| updater(order, &courier))
			.await?;
		Ok((order, courier))
	}

	/// Must be called with the order's lock held.
	async fn apply<F>(&self, mut order: Order, updater: F) -> Result<Order, LifecycleError>
	where
		F: FnOnce(&mut Order) -> Result<(), LifecycleError>,
	{
		updater(&mut order)?;
		order.updated_at = Utc::now();

		self.storage
			.update(StorageKey::Orders.as_str(), &order.id, &order)
			.await
			.map_err(|e| LifecycleError::from_lookup("Order", &order.id, e))?;

		Ok(order)
	}

	pub(crate) fn lock_for(&self, order_id: &str) -> Arc<Mutex<()>> {
		self.locks
			.entry(order_id.to_string())
			.or_default()
			.clone()
	}

	/// Drops the map entry once nobody else holds or waits on the lock.
	fn release_lock(&self, order_id: &str, lock: Arc<Mutex<()>>) {
		drop(lock);
		self.locks
			.remove_if(order_id, |_, lock| Arc::strong_count(lock) == 1);
	}

	#[cfg(test)]
	pub(crate) fn lock_count(&self) -> usize {
		self.locks.len()
	}

	pub(crate) fn publish(&self, event: OrderEvent) {
		if self.event_bus.publish(event).is_err() {
			tracing::trace!("No event subscribers");
		}
	}

	/// Writes an order as-is, bypassing validation.
	#[cfg(test)]
	pub(crate) async fn store_order(&self, order: &Order) -> Result<(), LifecycleError> {
		self.storage
			.store(StorageKey::Orders.as_str(), &order.id, order)
			.await?;
		Ok(())
	}
}
