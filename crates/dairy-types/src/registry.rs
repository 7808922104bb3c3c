//! Registry trait for self-registering backends.
//!
//! Pluggable backends declare the name they are configured under and the
//! factory that builds them, so the service can assemble a lookup table
//! without hard-coding every implementation.

/// Base trait for implementation registries.
///
/// Each backend module provides a `Registry` struct implementing this trait.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "memory" for `[storage.implementations.memory]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
