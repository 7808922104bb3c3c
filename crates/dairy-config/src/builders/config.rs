//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults, particularly useful for testing scenarios.

use crate::{
	ApiConfig, AuthConfig, Config, PricingConfig, ServiceConfig, StorageConfig, TokenConfig,
};
use dairy_types::{Decimal, Role};
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to in-memory storage, standard pricing and no API section.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	storage_primary: String,
	storage_implementations: HashMap<String, toml::Value>,
	pricing: PricingConfig,
	api: Option<ApiConfig>,
	tokens: HashMap<String, TokenConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		let mut storage_implementations = HashMap::new();
		storage_implementations.insert(
			"memory".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);

		Self {
			service_id: "dairy-test".to_string(),
			storage_primary: "memory".to_string(),
			storage_implementations,
			pricing: PricingConfig::default(),
			api: None,
			tokens: HashMap::new(),
		}
	}

	/// Sets the service ID.
	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Registers a storage implementation and makes it primary.
	pub fn storage(mut self, name: impl Into<String>, config: toml::Value) -> Self {
		let name = name.into();
		self.storage_implementations.insert(name.clone(), config);
		self.storage_primary = name;
		self
	}

	/// Sets the flat delivery charge.
	pub fn delivery_charge(mut self, charge: Decimal) -> Self {
		self.pricing.delivery_charge = charge;
		self
	}

	/// Sets the courier commission rate.
	pub fn commission_rate(mut self, rate: Decimal) -> Self {
		self.pricing.commission_rate = rate;
		self
	}

	/// Sets the API configuration.
	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	/// Adds a bearer token for the static identity provider.
	pub fn token(mut self, token: impl Into<String>, user_id: impl Into<String>, role: Role) -> Self {
		self.tokens.insert(
			token.into(),
			TokenConfig {
				user_id: user_id.into(),
				role,
			},
		);
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		Config {
			service: ServiceConfig {
				id: self.service_id,
			},
			pricing: self.pricing,
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations: self.storage_implementations,
			},
			api: self.api,
			auth: AuthConfig {
				tokens: self.tokens,
			},
		}
	}
}
