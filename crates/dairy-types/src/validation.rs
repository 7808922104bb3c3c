//! Validation of storage backend sections.
//!
//! Every key a backend accepts is a string. A `Schema` lists the keys that
//! must be present, the keys that may be present, and rejects anything else
//! so a misspelt `storage_path` is reported instead of silently ignored.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Field '{field}' must be a string, got {actual}")]
	NotAString { field: String, actual: String },
	#[error("Unknown field '{0}'")]
	UnknownField(String),
	#[error("Backend section must be a table, got {0}")]
	NotATable(String),
}

/// Extra check run on a field's string value.
pub type FieldValidator = Box<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// A string-valued key of a backend section.
pub struct Field {
	pub name: String,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			validator: None,
		}
	}

	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		let text = value.as_str().ok_or_else(|| ValidationError::NotAString {
			field: self.name.clone(),
			actual: value.type_str().to_string(),
		})?;
		if let Some(validator) = &self.validator {
			validator(text).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// The keys a backend section may contain.
#[derive(Debug, Default)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Checks presence, string type and custom validators, then rejects
	/// keys the schema does not list.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::NotATable(config.type_str().to_string()))?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}
		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		let known = |key: &str| {
			self.required
				.iter()
				.chain(&self.optional)
				.any(|field| field.name == key)
		};
		// Sorted so the reported key does not depend on table order.
		let mut unknown: Vec<&String> = table.keys().filter(|key| !known(key)).collect();
		unknown.sort();
		match unknown.first() {
			Some(key) => Err(ValidationError::UnknownField((*key).clone())),
			None => Ok(()),
		}
	}
}

/// A configuration schema that can validate a backend's TOML section.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(
			vec![Field::new("storage_path").with_validator(|path| {
				if path.trim().is_empty() {
					Err("must not be empty".into())
				} else {
					Ok(())
				}
			})],
			vec![Field::new("label")],
		)
	}

	fn parse(text: &str) -> toml::Value {
		toml::from_str(text).unwrap()
	}

	#[test]
	fn test_accepts_known_string_fields() {
		assert!(schema().validate(&parse("storage_path = \"./data\"")).is_ok());
		assert!(schema()
			.validate(&parse("storage_path = \"./data\"\nlabel = \"main\""))
			.is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let err = schema().validate(&parse("label = \"x\"")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "storage_path"));
	}

	#[test]
	fn test_non_string_value() {
		let err = schema().validate(&parse("storage_path = 42")).unwrap_err();
		assert!(matches!(err, ValidationError::NotAString { field, .. } if field == "storage_path"));
	}

	#[test]
	fn test_custom_validator() {
		let err = schema().validate(&parse("storage_path = \"  \"")).unwrap_err();
		assert!(matches!(err, ValidationError::InvalidValue { field, .. } if field == "storage_path"));
	}

	#[test]
	fn test_unknown_field_is_rejected() {
		let err = schema()
			.validate(&parse("storage_path = \"./data\"\nstorage_pth = \"./typo\""))
			.unwrap_err();
		assert!(matches!(err, ValidationError::UnknownField(f) if f == "storage_pth"));

		let err = Schema::default().validate(&parse("anything = 1")).unwrap_err();
		assert!(matches!(err, ValidationError::UnknownField(_)));
	}

	#[test]
	fn test_section_must_be_a_table() {
		let err = Schema::default()
			.validate(&toml::Value::String("memory".into()))
			.unwrap_err();
		assert!(matches!(err, ValidationError::NotATable(_)));
	}
}
