//! Storage module for the dairy order service.
//!
//! This module provides abstractions for persistent storage of orders, users
//! and products, supporting different backend implementations such as
//! in-memory or file-based storage.

use async_trait::async_trait;
use dairy_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Keys have the form `namespace:id`. Every value is written as a single
/// blob, so a reader never observes a partially written record.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns every value stored under the namespace, in no particular order.
	async fn list_bytes(&self, namespace: &str) -> Result<Vec<Vec<u8>>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must provide
/// to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with
/// automatic serialization/deserialization.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value, creating or overwriting it.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	/// Updates an existing value in storage.
	///
	/// Returns `NotFound` if the key doesn't exist, making it semantically
	/// different from store() which will create or overwrite.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = Self::key(namespace, id);

		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}

		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	/// Retrieves and deserializes every value in a namespace.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		self.backend
			.list_bytes(namespace)
			.await?
			.iter()
			.map(|bytes| {
				serde_json::from_slice(bytes)
					.map_err(|e| StorageError::Serialization(e.to_string()))
			})
			.collect()
	}
}
