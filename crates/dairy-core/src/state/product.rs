//! Product catalog.
//!
//! Orders never reference live product data: placing an order copies the
//! name and price into the order as snapshots via [`ProductCatalog::resolve_lines`].

use crate::LifecycleError;
use chrono::Utc;
use dairy_storage::StorageService;
use dairy_types::{
	Decimal, NewProduct, OrderItemDraft, OrderLineRequest, Product, ProductPatch, StorageKey,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct ProductCatalog {
	storage: Arc<StorageService>,
	write_lock: Mutex<()>,
}

fn validate_name(name: &str) -> Result<(), LifecycleError> {
	if name.trim().is_empty() {
		return Err(LifecycleError::Validation("product name cannot be blank".into()));
	}
	Ok(())
}

fn validate_price(price: Decimal) -> Result<(), LifecycleError> {
	if price <= Decimal::ZERO {
		return Err(LifecycleError::Validation(format!(
			"product price must be positive, got {}",
			price
		)));
	}
	Ok(())
}

impl ProductCatalog {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			write_lock: Mutex::new(()),
		}
	}

	pub async fn create(&self, new_product: NewProduct) -> Result<Product, LifecycleError> {
		validate_name(&new_product.name)?;
		validate_price(new_product.price)?;

		let now = Utc::now();
		let product = Product {
			id: Uuid::new_v4().to_string(),
			name: new_product.name.trim().to_string(),
			description: new_product.description,
			price: new_product.price,
			category: new_product.category,
			stock_count: new_product.stock_count,
			is_active: true,
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Products.as_str(), &product.id, &product)
			.await?;

		tracing::info!(product_id = %product.id, name = %product.name, "Created product");
		Ok(product)
	}

	pub async fn get(&self, id: &str) -> Result<Product, LifecycleError> {
		self.storage
			.retrieve(StorageKey::Products.as_str(), id)
			.await
			.map_err(|e| LifecycleError::from_lookup("Product", id, e))
	}

	/// Lists products ordered by name.
	pub async fn list(&self, active_only: bool) -> Result<Vec<Product>, LifecycleError> {
		let mut products: Vec<Product> = self
			.storage
			.retrieve_all(StorageKey::Products.as_str())
			.await?;
		if active_only {
			products.retain(|p| p.is_active);
		}
		products.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(products)
	}

	/// Applies the fields present in `patch`.
	pub async fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, LifecycleError> {
		if let Some(name) = &patch.name {
			validate_name(name)?;
		}
		if let Some(price) = patch.price {
			validate_price(price)?;
		}

		self.modify(id, |product| {
			if let Some(name) = patch.name {
				product.name = name.trim().to_string();
			}
			if let Some(description) = patch.description {
				product.description = description;
			}
			if let Some(price) = patch.price {
				product.price = price;
			}
			if let Some(category) = patch.category {
				product.category = category;
			}
			if let Some(is_active) = patch.is_active {
				product.is_active = is_active;
			}
		})
		.await
	}

	pub async fn set_stock(&self, id: &str, stock_count: u32) -> Result<Product, LifecycleError> {
		self.modify(id, |product| product.stock_count = stock_count)
			.await
	}

	pub async fn delete(&self, id: &str) -> Result<(), LifecycleError> {
		let _guard = self.write_lock.lock().await;
		if !self
			.storage
			.exists(StorageKey::Products.as_str(), id)
			.await?
		{
			return Err(LifecycleError::not_found("Product", id));
		}
		self.storage
			.remove(StorageKey::Products.as_str(), id)
			.await?;
		tracing::info!(product_id = %id, "Deleted product");
		Ok(())
	}

	async fn modify<F>(&self, id: &str, apply: F) -> Result<Product, LifecycleError>
	where
		F: FnOnce(&mut Product),
	{
		let _guard = self.write_lock.lock().await;
		let mut product = self.get(id).await?;
		apply(&mut product);
		product.updated_at = Utc::now();
		self.storage
			.update(StorageKey::Products.as_str(), id, &product)
			.await?;
		Ok(product)
	}

	/// Turns requested order lines into item drafts carrying name and price
	/// snapshots. Unknown or inactive products are a validation failure.
	pub async fn resolve_lines(
		&self,
		lines: &[OrderLineRequest],
	) -> Result<Vec<OrderItemDraft>, LifecycleError> {
		let mut drafts = Vec::with_capacity(lines.len());
		for line in lines {
			let product = match self.get(&line.product_id).await {
				Ok(product) => product,
				Err(LifecycleError::NotFound { .. }) => {
					return Err(LifecycleError::Validation(format!(
						"unknown product {}",
						line.product_id
					)))
				},
				Err(e) => return Err(e),
			};
			if !product.is_active {
				return Err(LifecycleError::Validation(format!(
					"product {} is not available",
					product.name
				)));
			}
			drafts.push(OrderItemDraft::new(
				product.id,
				product.name,
				line.quantity,
				product.price,
			));
		}
		Ok(drafts)
	}
}
