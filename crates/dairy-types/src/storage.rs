//! Storage-related types for the dairy service.

use std::str::FromStr;

/// Storage keys for different data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Key for storing order data
	Orders,
	/// Key for reserving human-readable order numbers
	OrderNumbers,
	/// Key for storing users of every role
	Users,
	/// Key for mapping usernames to user IDs
	UserByName,
	/// Key for storing catalog products
	Products,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::OrderNumbers => "order_numbers",
			StorageKey::Users => "users",
			StorageKey::UserByName => "user_by_name",
			StorageKey::Products => "products",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Orders,
			Self::OrderNumbers,
			Self::Users,
			Self::UserByName,
			Self::Products,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().find(|key| key.as_str() == s).ok_or(())
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
