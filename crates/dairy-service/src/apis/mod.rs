//! REST handlers, one module per resource.

pub mod delivery;
pub mod orders;
pub mod products;
pub mod stats;
pub mod users;

use dairy_core::LifecycleError;
use dairy_types::{APIError, Actor, Role};

/// Converts a domain error into an API error, logging the rejection.
pub(crate) fn reject(operation: &'static str) -> impl FnOnce(LifecycleError) -> APIError {
	move |e| {
		match &e {
			LifecycleError::Storage(_) => {
				tracing::error!(operation, error = %e, "Request failed");
			},
			_ => tracing::warn!(operation, error = %e, "Request rejected"),
		}
		APIError::from(e)
	}
}

/// Fails with 403 unless the actor holds one of `roles`.
pub(crate) fn require_role(actor: &Actor, roles: &[Role]) -> Result<(), APIError> {
	dairy_core::require_role(actor, roles).map_err(APIError::from)
}

/// Admins may read anyone's courier data; couriers only their own.
pub(crate) fn require_admin_or_self(actor: &Actor, delivery_id: &str) -> Result<(), APIError> {
	match actor.role {
		Role::Admin => Ok(()),
		Role::Delivery if actor.id == delivery_id => Ok(()),
		_ => Err(APIError::Forbidden {
			message: "Cannot view another delivery person's data".to_string(),
		}),
	}
}
