use crate::engine::event_bus::EventBus;
use crate::DairyEngine;
use dairy_config::ConfigBuilder;
use dairy_storage::implementations::memory::MemoryStorage;
use dairy_storage::StorageService;
use dairy_types::{
	Actor, CreateOrderRequest, Decimal, NewProduct, NewUser, Order, OrderLineRequest,
	PaymentMethod, Product, ProductCategory, Role, User,
};
use std::sync::Arc;

/// In-memory engine with one customer and one product.
pub(crate) struct Harness {
	pub engine: DairyEngine,
	pub admin: Actor,
	pub customer: User,
	pub product: Product,
}

impl Harness {
	pub async fn new() -> Self {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		Self::with_engine(DairyEngine::new(
			ConfigBuilder::new().build(),
			storage,
			EventBus::default(),
		))
		.await
	}

	pub async fn with_engine(engine: DairyEngine) -> Self {
		let customer = engine
			.users()
			.register(NewUser::new("carol", Role::Customer))
			.await
			.unwrap();
		let product = engine
			.products()
			.create(NewProduct {
				name: "Farm Butter".into(),
				description: "250g block".into(),
				price: Decimal::new(2500, 2),
				category: ProductCategory::Butter,
				stock_count: 100,
			})
			.await
			.unwrap();

		Self {
			engine,
			admin: Actor::admin("admin-1"),
			customer,
			product,
		}
	}

	pub async fn courier(&self, username: &str) -> User {
		self.engine
			.users()
			.register(NewUser::new(username, Role::Delivery))
			.await
			.unwrap()
	}

	/// Places a 2 x 25.00 order for the harness customer.
	pub async fn order(&self) -> Order {
		self.engine
			.place_order(
				&Actor::customer(&self.customer.id),
				CreateOrderRequest {
					items: vec![OrderLineRequest {
						product_id: self.product.id.clone(),
						quantity: 2,
					}],
					delivery_location: "12 Dairy Road".into(),
					delivery_instructions: Some("Leave by the gate".into()),
					payment_method: PaymentMethod::Cod,
				},
			)
			.await
			.unwrap()
	}
}
