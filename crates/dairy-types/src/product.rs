//! Product catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product categories offered by the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ProductCategory {
	Milk,
	Cheese,
	Yogurt,
	Butter,
	Cream,
	#[default]
	Other,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	/// Unit price, always positive.
	pub price: Decimal,
	pub category: ProductCategory,
	pub stock_count: u32,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Payload for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub price: Decimal,
	#[serde(default)]
	pub category: ProductCategory,
	#[serde(default)]
	pub stock_count: u32,
}

/// Partial update for a product. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
	pub name: Option<String>,
	pub description: Option<String>,
	pub price: Option<Decimal>,
	pub category: Option<ProductCategory>,
	pub is_active: Option<bool>,
}
