//! In-memory storage backend.
//!
//! Useful for tests and development where persistence across restarts is
//! not required.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use dairy_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage implementation backed by a `HashMap`.
pub struct MemoryStorage {
	/// The in-memory store protected by a read-write lock.
	store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.contains_key(key))
	}

	async fn list_bytes(&self, namespace: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let prefix = format!("{}:", namespace);
		let store = self.store.read().await;
		Ok(store
			.iter()
			.filter(|(key, _)| key.starts_with(&prefix))
			.map(|(_, value)| value.clone())
			.collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::default().validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// No configuration parameters are required.
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryStorage::new()))
}

/// Registry for the in-memory storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		let key = "orders:o1";
		let value = b"test_value".to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());

		let result = storage.get_bytes(key).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_overwrite() {
		let storage = MemoryStorage::new();

		let key = "users:u1";
		storage.set_bytes(key, b"value1".to_vec()).await.unwrap();
		storage.set_bytes(key, b"value2".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"value2".to_vec());
	}

	#[tokio::test]
	async fn test_list_matches_whole_namespace_only() {
		let storage = MemoryStorage::new();
		storage.set_bytes("orders:a", b"a".to_vec()).await.unwrap();
		storage.set_bytes("orders:b", b"b".to_vec()).await.unwrap();
		storage
			.set_bytes("order_numbers:ORD-1", b"n".to_vec())
			.await
			.unwrap();

		let mut values = storage.list_bytes("orders").await.unwrap();
		values.sort();
		assert_eq!(values, vec![b"a".to_vec(), b"b".to_vec()]);
		assert!(storage.list_bytes("products").await.unwrap().is_empty());
	}

	#[test]
	fn test_rejects_non_table_config() {
		let config = toml::Value::String("memory".into());
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));
	}
}
