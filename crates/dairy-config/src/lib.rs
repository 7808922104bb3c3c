//! Configuration module for the dairy delivery service.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files with
//! environment variable substitution and validates that all required values
//! are set and within range.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod builders;
mod loader;

pub use builders::config::ConfigBuilder;

use dairy_types::{Decimal, Role};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the dairy service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// Fees and commission applied to orders.
	#[serde(default)]
	pub pricing: PricingConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
	/// Static bearer tokens used by the bundled identity provider.
	#[serde(default)]
	pub auth: AuthConfig,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this instance, used in logs.
	pub id: String,
}

/// Pricing constants.
///
/// The storefront historically hard-coded a 5.00 delivery fee and a 10%
/// courier commission; both are configuration here.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PricingConfig {
	/// Flat fee added to every order.
	#[serde(default = "default_delivery_charge")]
	pub delivery_charge: Decimal,
	/// Share of an order's total credited to the courier on delivery.
	#[serde(default = "default_commission_rate")]
	pub commission_rate: Decimal,
}

impl Default for PricingConfig {
	fn default() -> Self {
		Self {
			delivery_charge: default_delivery_charge(),
			commission_rate: default_commission_rate(),
		}
	}
}

/// Returns the default delivery charge of 5.00.
fn default_delivery_charge() -> Decimal {
	Decimal::new(500, 2)
}

/// Returns the default commission rate of 10%.
fn default_commission_rate() -> Decimal {
	Decimal::new(10, 2)
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// CORS configuration. Permissive when absent.
	pub cors: Option<CorsConfig>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			host: default_api_host(),
			port: default_api_port(),
			timeout_seconds: default_api_timeout(),
			max_request_size: default_max_request_size(),
			cors: None,
		}
	}
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS.
	pub allowed_origins: Vec<String>,
	/// Allowed headers for CORS.
	#[serde(default)]
	pub allowed_headers: Vec<String>,
	/// Allowed methods for CORS.
	#[serde(default)]
	pub allowed_methods: Vec<String>,
}

/// Bearer token table for the static identity provider.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
	/// Map of bearer token to the identity it authenticates.
	#[serde(default)]
	pub tokens: HashMap<String, TokenConfig>,
}

/// Identity bound to a bearer token.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TokenConfig {
	pub user_id: String,
	pub role: Role,
}

/// Returns the default API host.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
///
/// The storefront frontend expects its backend on port 5000.
fn default_api_port() -> u16 {
	5000
}

/// Returns the default API timeout in seconds.
fn default_api_timeout() -> u64 {
	15
}

/// Returns the default maximum request size in bytes (1MB).
fn default_max_request_size() -> usize {
	1024 * 1024
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		// Validate pricing
		if self.pricing.delivery_charge.is_sign_negative() {
			return Err(ConfigError::Validation(
				"pricing.delivery_charge cannot be negative".into(),
			));
		}
		if self.pricing.commission_rate.is_sign_negative()
			|| self.pricing.commission_rate > Decimal::ONE
		{
			return Err(ConfigError::Validation(
				"pricing.commission_rate must be between 0 and 1".into(),
			));
		}

		// Validate storage config
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		// Validate API config if enabled
		if let Some(ref api) = self.api {
			if api.enabled && api.port == 0 {
				return Err(ConfigError::Validation("API port cannot be 0".into()));
			}
		}

		for (token, identity) in &self.auth.tokens {
			if token.len() < 16 {
				return Err(ConfigError::Validation(format!(
					"Auth token for user '{}' must be at least 16 characters",
					identity.user_id
				)));
			}
			if identity.user_id.is_empty() {
				return Err(ConfigError::Validation(
					"Auth token user_id cannot be empty".into(),
				));
			}
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
