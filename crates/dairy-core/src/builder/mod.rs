//! Builder pattern for constructing dairy engines.
//!
//! Storage is pluggable: the builder receives a table of storage factories
//! keyed by implementation name and instantiates the ones named in the
//! configuration.

use crate::engine::{event_bus::EventBus, DairyEngine};
use dairy_config::Config;
use dairy_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a DairyEngine.
pub struct DairyFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing a DairyEngine with pluggable storage.
pub struct DairyBuilder {
	config: Config,
	event_capacity: usize,
}

impl DairyBuilder {
	/// Creates a new DairyBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			event_capacity: 1000,
		}
	}

	/// Sets the event bus capacity.
	pub fn event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity;
		self
	}

	/// Builds the DairyEngine, creating every configured storage
	/// implementation and keeping the primary one.
	pub fn build<SF>(self, factories: DairyFactories<SF>) -> Result<DairyEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = factories.storage_factories.get(name) else {
				tracing::warn!(
					component = "storage",
					implementation = %name,
					"No factory registered, skipping"
				);
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					storage_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		if storage_impls.is_empty() {
			return Err(BuilderError::MissingComponent(
				"No valid storage implementations available".into(),
			));
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;

		let storage = Arc::new(StorageService::new(storage_backend));
		let event_bus = EventBus::new(self.event_capacity);

		tracing::info!(
			service_id = %self.config.service.id,
			delivery_charge = %self.config.pricing.delivery_charge,
			commission_rate = %self.config.pricing.commission_rate,
			"Engine ready"
		);
		Ok(DairyEngine::new(self.config, storage, event_bus))
	}
}
