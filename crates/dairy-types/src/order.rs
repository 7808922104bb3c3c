//! Order types for the dairy delivery service.
//!
//! This module defines the order entity, its line items, the lifecycle
//! status enumeration and the payment enumerations, together with the
//! request shapes used to create and list orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A customer order together with its lifecycle state.
///
/// Monetary fields are computed once at creation. The only fields that
/// change afterwards are `status`, `assigned_delivery_id`, `payment_status`
/// and the timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Opaque unique identifier.
	pub id: String,
	/// Human-readable order number, unique within the store.
	pub order_number: String,
	/// Customer who placed the order.
	pub customer_id: String,
	/// Line items with product snapshots taken at creation time.
	pub items: Vec<OrderItem>,
	/// Sum of all line totals.
	pub subtotal: Decimal,
	/// Flat delivery fee applied to the order.
	pub delivery_charge: Decimal,
	/// `subtotal + delivery_charge`.
	pub total_price: Decimal,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Delivery person the order is bound to, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assigned_delivery_id: Option<String>,
	/// Free-text delivery address.
	pub delivery_location: String,
	/// Optional notes for the courier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delivery_instructions: Option<String>,
	pub payment_method: PaymentMethod,
	pub payment_status: PaymentStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	/// Set exactly once, on the transition into `Delivered`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delivery_completed_at: Option<DateTime<Utc>>,
}

impl Order {
	/// Returns true while the order still needs work from someone.
	pub fn is_active(&self) -> bool {
		!self.status.is_terminal()
	}

	/// Returns true if the order is bound to the given delivery person.
	pub fn is_assigned_to(&self, delivery_id: &str) -> bool {
		self.assigned_delivery_id.as_deref() == Some(delivery_id)
	}
}

/// A single order line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
	pub product_id: String,
	/// Product name at the time the order was placed.
	pub product_name: String,
	pub quantity: u32,
	/// Unit price at the time the order was placed.
	pub unit_price: Decimal,
	/// `quantity * unit_price`.
	pub line_total: Decimal,
}

/// An order line as supplied by the caller, before totals are computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDraft {
	pub product_id: String,
	pub product_name: String,
	pub quantity: u32,
	pub unit_price: Decimal,
}

impl OrderItemDraft {
	pub fn new(
		product_id: impl Into<String>,
		product_name: impl Into<String>,
		quantity: u32,
		unit_price: Decimal,
	) -> Self {
		Self {
			product_id: product_id.into(),
			product_name: product_name.into(),
			quantity,
			unit_price,
		}
	}
}

/// Everything needed to place an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
	pub customer_id: String,
	pub items: Vec<OrderItemDraft>,
	pub delivery_location: String,
	#[serde(default)]
	pub delivery_instructions: Option<String>,
	#[serde(default)]
	pub payment_method: PaymentMethod,
}

/// Status of an order in its lifecycle.
///
/// Legal moves are
/// `Pending -> {Confirmed, Processing (via assignment), Cancelled}`,
/// `Confirmed -> {Processing, Cancelled}`,
/// `Processing -> {Shipped, Cancelled}` and `Shipped -> Delivered`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
	Pending,
	Confirmed,
	Processing,
	Shipped,
	Delivered,
	Cancelled,
}

impl OrderStatus {
	/// Returns true for statuses that have no outgoing edges.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "Pending",
			OrderStatus::Confirmed => "Confirmed",
			OrderStatus::Processing => "Processing",
			OrderStatus::Shipped => "Shipped",
			OrderStatus::Delivered => "Delivered",
			OrderStatus::Cancelled => "Cancelled",
		}
	}

	/// Returns an iterator over all statuses.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Confirmed,
			Self::Processing,
			Self::Shipped,
			Self::Delivered,
			Self::Cancelled,
		]
		.into_iter()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all()
			.find(|status| status.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| format!("unknown order status '{}'", s))
	}
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PaymentMethod {
	/// Cash on delivery.
	#[default]
	#[serde(rename = "COD")]
	Cod,
	Online,
}

impl PaymentMethod {
	/// Initial payment status implied by the method.
	///
	/// Online payments are captured at checkout, cash is collected on delivery.
	pub fn initial_status(&self) -> PaymentStatus {
		match self {
			PaymentMethod::Cod => PaymentStatus::Pending,
			PaymentMethod::Online => PaymentStatus::Paid,
		}
	}
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
	Pending,
	Paid,
}

/// Criteria for listing orders. Empty criteria match every order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
	#[serde(default)]
	pub status: Option<OrderStatus>,
	#[serde(default)]
	pub customer_id: Option<String>,
	#[serde(default, alias = "deliveryId")]
	pub assigned_delivery_id: Option<String>,
}

impl OrderFilter {
	pub fn by_status(status: OrderStatus) -> Self {
		Self {
			status: Some(status),
			..Self::default()
		}
	}

	pub fn by_customer(customer_id: impl Into<String>) -> Self {
		Self {
			customer_id: Some(customer_id.into()),
			..Self::default()
		}
	}

	pub fn by_delivery(delivery_id: impl Into<String>) -> Self {
		Self {
			assigned_delivery_id: Some(delivery_id.into()),
			..Self::default()
		}
	}

	/// Returns true if the order satisfies every criterion that is set.
	pub fn matches(&self, order: &Order) -> bool {
		self.status.is_none_or(|status| order.status == status)
			&& self
				.customer_id
				.as_deref()
				.is_none_or(|id| order.customer_id == id)
			&& self
				.assigned_delivery_id
				.as_deref()
				.is_none_or(|id| order.is_assigned_to(id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_round_trips_through_strings() {
		for status in OrderStatus::all() {
			assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
		}
		assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
		assert!("Lost".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn test_terminal_statuses() {
		let terminal: Vec<_> = OrderStatus::all().filter(|s| s.is_terminal()).collect();
		assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
	}

	#[test]
	fn test_payment_method_serde_names() {
		assert_eq!(serde_json::to_string(&PaymentMethod::Cod).unwrap(), "\"COD\"");
		let online: PaymentMethod = serde_json::from_str("\"Online\"").unwrap();
		assert_eq!(online.initial_status(), PaymentStatus::Paid);
		assert_eq!(PaymentMethod::default().initial_status(), PaymentStatus::Pending);
	}

	#[test]
	fn test_filter_accepts_delivery_id_alias() {
		let filter: OrderFilter = serde_json::from_str(r#"{"deliveryId":"d1"}"#).unwrap();
		assert_eq!(filter, OrderFilter::by_delivery("d1"));
	}
}
