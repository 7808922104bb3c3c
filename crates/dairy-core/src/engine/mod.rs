//! Dairy engine that wires the order lifecycle components together.
//!
//! The engine owns one instance of each component, all sharing the same
//! storage service and event bus. It is cheap to clone and is shared by
//! every request handler in the service.

pub mod event_bus;

use crate::error::require_role;
use crate::handlers::{AssignmentHandler, TransitionHandler};
use crate::state::{OrderStore, ProductCatalog, UserDirectory};
use crate::stats::StatsAggregator;
use crate::LifecycleError;
use dairy_config::Config;
use dairy_storage::StorageService;
use dairy_types::{Actor, CreateOrderRequest, NewOrder, NewUser, Order, Role};
use event_bus::EventBus;
use std::sync::Arc;

/// Main engine exposing the order store, roster, catalog, assignment,
/// transition and stats components.
#[derive(Clone)]
pub struct DairyEngine {
	config: Config,
	users: Arc<UserDirectory>,
	products: Arc<ProductCatalog>,
	orders: Arc<OrderStore>,
	transitions: Arc<TransitionHandler>,
	assignments: Arc<AssignmentHandler>,
	stats: Arc<StatsAggregator>,
	event_bus: EventBus,
}

impl DairyEngine {
	pub fn new(config: Config, storage: Arc<StorageService>, event_bus: EventBus) -> Self {
		let users = Arc::new(UserDirectory::new(storage.clone()));
		let products = Arc::new(ProductCatalog::new(storage.clone()));
		let orders = Arc::new(OrderStore::new(
			storage,
			users.clone(),
			event_bus.clone(),
			config.pricing.delivery_charge,
		));
		let transitions = Arc::new(TransitionHandler::new(orders.clone()));
		let assignments = Arc::new(AssignmentHandler::new(orders.clone()));
		let stats = Arc::new(StatsAggregator::new(
			orders.clone(),
			users.clone(),
			config.pricing.commission_rate,
		));

		Self {
			config,
			users,
			products,
			orders,
			transitions,
			assignments,
			stats,
			event_bus,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn users(&self) -> &UserDirectory {
		&self.users
	}

	pub fn products(&self) -> &ProductCatalog {
		&self.products
	}

	pub fn orders(&self) -> &OrderStore {
		&self.orders
	}

	pub fn transitions(&self) -> &TransitionHandler {
		&self.transitions
	}

	pub fn assignments(&self) -> &AssignmentHandler {
		&self.assignments
	}

	pub fn stats(&self) -> &StatsAggregator {
		&self.stats
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Places an order for the acting customer, snapshotting product names
	/// and prices from the catalog.
	pub async fn place_order(
		&self,
		actor: &Actor,
		request: CreateOrderRequest,
	) -> Result<Order, LifecycleError> {
		require_role(actor, &[Role::Customer])?;
		let items = self.products.resolve_lines(&request.items).await?;

		self.orders
			.create_order(NewOrder {
				customer_id: actor.id.clone(),
				items,
				delivery_location: request.delivery_location,
				delivery_instructions: request.delivery_instructions,
				payment_method: request.payment_method,
			})
			.await
	}

	/// Creates directory entries for identities declared in configuration
	/// that do not exist yet. Returns how many identities were checked.
	pub async fn seed_identities(&self) -> Result<usize, LifecycleError> {
		let mut seeded = 0;
		for token in self.config.auth.tokens.values() {
			self.users
				.seed(&token.user_id, NewUser::new(token.user_id.clone(), token.role))
				.await?;
			seeded += 1;
		}
		if seeded > 0 {
			tracing::info!(count = seeded, "Seeded configured identities");
		}
		Ok(seeded)
	}
}
