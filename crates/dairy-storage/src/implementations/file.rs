//! File-based storage backend.
//!
//! Each record lives in its own file under `<storage_path>/<namespace>/`,
//! prefixed with a small header identifying the format. Writes go to a
//! temporary file that is renamed into place, so readers see either the old
//! or the new record.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use dairy_types::{ConfigSchema, Field, ImplementationRegistry, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;

#[allow(clippy::doc_nested_refdefs)]
/// Fixed-size file header.
///
/// Binary layout (8 bytes total):
/// - [0-3]: Magic bytes "DRYS"
/// - [4-5]: Version (u16, little-endian)
/// - [6-7]: Reserved
#[derive(Debug, Clone, PartialEq)]
struct FileHeader {
	version: u16,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"DRYS";
	const VERSION: u16 = 1;
	const SIZE: usize = 8;

	fn current() -> Self {
		Self {
			version: Self::VERSION,
		}
	}

	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes
	}

	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}

		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Unrecognized file format".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		Ok(Self { version })
	}

	/// Strips the header, returning the payload.
	fn payload(data: &[u8]) -> Result<Vec<u8>, StorageError> {
		Self::deserialize(data)?;
		Ok(data[Self::SIZE..].to_vec())
	}
}

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Percent-encodes every byte outside `[A-Za-z0-9_-]`.
	///
	/// The mapping is injective, so distinct ids never share a file, and the
	/// result never contains a path separator or a leading dot.
	fn sanitize(part: &str) -> String {
		let mut encoded = String::with_capacity(part.len());
		for byte in part.bytes() {
			if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
				encoded.push(byte as char);
			} else {
				encoded.push_str(&format!("%{:02X}", byte));
			}
		}
		encoded
	}

	fn namespace_dir(&self, namespace: &str) -> PathBuf {
		self.base_path.join(Self::sanitize(namespace))
	}

	/// Maps `namespace:id` to `<base>/<namespace>/<id>.bin`.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let (namespace, id) = key.split_once(':').unwrap_or(("default", key));
		self.namespace_dir(namespace)
			.join(format!("{}.bin", Self::sanitize(id)))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		let data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		FileHeader::payload(&data)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&FileHeader::current().serialize());
		file_data.extend_from_slice(&value);

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn list_bytes(&self, namespace: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let dir = self.namespace_dir(namespace);
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut values = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}
			match fs::read(&path).await {
				Ok(data) => values.push(FileHeader::payload(&data)?),
				// Removed between listing and reading.
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
					tracing::debug!("Skipping file {:?}: removed during scan", path);
				},
				Err(e) => return Err(StorageError::Backend(e.to_string())),
			}
		}
		Ok(values)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path").with_validator(|path| {
					if path.trim().is_empty() {
						Err("storage_path cannot be empty".to_string())
					} else {
						Ok(())
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage");

	tracing::debug!(path = %storage_path, "Using file storage");
	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_roundtrip_and_delete() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage
			.set_bytes("orders:o-1", b"{\"id\":\"o-1\"}".to_vec())
			.await
			.unwrap();
		assert!(dir.path().join("orders").join("o-1.bin").exists());
		assert_eq!(
			storage.get_bytes("orders:o-1").await.unwrap(),
			b"{\"id\":\"o-1\"}".to_vec()
		);
		assert!(storage.exists("orders:o-1").await.unwrap());

		storage.delete("orders:o-1").await.unwrap();
		assert!(!storage.exists("orders:o-1").await.unwrap());
		assert!(matches!(
			storage.get_bytes("orders:o-1").await,
			Err(StorageError::NotFound)
		));
		// Deleting again is not an error.
		storage.delete("orders:o-1").await.unwrap();
	}

	#[tokio::test]
	async fn test_list_reads_namespace_directory() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("products:p1", b"1".to_vec()).await.unwrap();
		storage.set_bytes("products:p2", b"2".to_vec()).await.unwrap();
		storage.set_bytes("users:u1", b"u".to_vec()).await.unwrap();

		let mut values = storage.list_bytes("products").await.unwrap();
		values.sort();
		assert_eq!(values, vec![b"1".to_vec(), b"2".to_vec()]);
		assert!(storage.list_bytes("orders").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_unsafe_characters_stay_inside_namespace() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage
			.set_bytes("user_by_name:../escape", b"x".to_vec())
			.await
			.unwrap();
		assert_eq!(
			storage.get_bytes("user_by_name:../escape").await.unwrap(),
			b"x".to_vec()
		);
		assert_eq!(storage.list_bytes("user_by_name").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_escaped_ids_do_not_collide() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("user_by_name:a:b", b"1".to_vec()).await.unwrap();
		storage.set_bytes("user_by_name:a_b", b"2".to_vec()).await.unwrap();
		storage.set_bytes("user_by_name:a/b", b"3".to_vec()).await.unwrap();
		storage.set_bytes("user_by_name:a%3Ab", b"4".to_vec()).await.unwrap();

		assert_eq!(storage.get_bytes("user_by_name:a:b").await.unwrap(), b"1".to_vec());
		assert_eq!(storage.get_bytes("user_by_name:a_b").await.unwrap(), b"2".to_vec());
		assert_eq!(storage.get_bytes("user_by_name:a/b").await.unwrap(), b"3".to_vec());
		assert_eq!(storage.get_bytes("user_by_name:a%3Ab").await.unwrap(), b"4".to_vec());
		assert_eq!(storage.list_bytes("user_by_name").await.unwrap().len(), 4);
	}

	#[test]
	fn test_sanitize_escapes_reversibly() {
		assert_eq!(FileStorage::sanitize("ORD-12ab_x"), "ORD-12ab_x");
		assert_eq!(FileStorage::sanitize("a:b"), "a%3Ab");
		assert_eq!(FileStorage::sanitize("../x"), "%2E%2E%2Fx");
		assert_eq!(FileStorage::sanitize("é"), "%C3%A9");
	}

	#[tokio::test]
	async fn test_foreign_file_is_rejected() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		std::fs::create_dir_all(dir.path().join("orders")).unwrap();
		std::fs::write(dir.path().join("orders").join("junk.bin"), b"not a record").unwrap();

		assert!(matches!(
			storage.get_bytes("orders:junk").await,
			Err(StorageError::Backend(_))
		));
	}

	#[test]
	fn test_header_version_check() {
		let mut bytes = FileHeader::current().serialize();
		assert_eq!(FileHeader::deserialize(&bytes).unwrap(), FileHeader::current());

		bytes[4] = 9;
		assert!(FileHeader::deserialize(&bytes).is_err());
	}

	#[test]
	fn test_schema_rejects_empty_path() {
		let config: toml::Value = toml::from_str("storage_path = \"  \"").unwrap();
		assert!(FileStorageSchema.validate(&config).is_err());

		let config: toml::Value = toml::from_str("storage_path = \"/var/lib/dairy\"").unwrap();
		assert!(FileStorageSchema.validate(&config).is_ok());

		let config: toml::Value = toml::from_str("storage_dir = \"/var/lib/dairy\"").unwrap();
		assert!(FileStorageSchema.validate(&config).is_err());
	}
}
