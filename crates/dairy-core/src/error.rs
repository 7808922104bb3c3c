//! Domain error type shared by every core component.

use dairy_storage::StorageError;
use dairy_types::{APIError, Actor, OrderStatus, Role};
use thiserror::Error;

/// Errors returned by order, roster, catalog and stats operations.
///
/// Each kind is distinct so callers can map it to a precise response; none
/// of them is retried automatically.
#[derive(Debug, Error)]
pub enum LifecycleError {
	#[error("Validation error: {0}")]
	Validation(String),
	#[error("{entity} not found: {id}")]
	NotFound { entity: &'static str, id: String },
	#[error("Invalid state: {0}")]
	InvalidState(String),
	#[error("Invalid transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("Not authorized: {0}")]
	Authorization(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl LifecycleError {
	pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
		Self::NotFound {
			entity,
			id: id.into(),
		}
	}

	/// Maps a storage lookup failure, turning a missing key into `NotFound`.
	pub(crate) fn from_lookup(entity: &'static str, id: &str, err: StorageError) -> Self {
		match err {
			StorageError::NotFound => Self::not_found(entity, id),
			other => Self::Storage(other.to_string()),
		}
	}
}

impl From<StorageError> for LifecycleError {
	fn from(err: StorageError) -> Self {
		Self::Storage(err.to_string())
	}
}

impl From<LifecycleError> for APIError {
	fn from(err: LifecycleError) -> Self {
		let message = err.to_string();
		match err {
			LifecycleError::Validation(_) => APIError::BadRequest {
				error_type: "VALIDATION_ERROR".to_string(),
				message,
			},
			LifecycleError::NotFound { .. } => APIError::NotFound {
				error_type: "NOT_FOUND".to_string(),
				message,
			},
			LifecycleError::InvalidState(_) => APIError::Conflict {
				error_type: "INVALID_STATE".to_string(),
				message,
				details: None,
			},
			LifecycleError::InvalidTransition { from, to } => APIError::Conflict {
				error_type: "INVALID_TRANSITION".to_string(),
				message,
				details: Some(serde_json::json!({ "from": from, "to": to })),
			},
			LifecycleError::Authorization(_) => APIError::Forbidden { message },
			LifecycleError::Storage(_) => APIError::InternalServerError { message },
		}
	}
}

/// Fails with `Authorization` unless the actor holds one of `roles`.
pub fn require_role(actor: &Actor, roles: &[Role]) -> Result<(), LifecycleError> {
	if roles.contains(&actor.role) {
		Ok(())
	} else {
		Err(LifecycleError::Authorization(format!(
			"{} role cannot perform this operation",
			actor.role
		)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_lookup_mapping() {
		let err = LifecycleError::from_lookup("Order", "o1", StorageError::NotFound);
		assert_eq!(err.to_string(), "Order not found: o1");

		let err = LifecycleError::from_lookup("Order", "o1", StorageError::Backend("disk".into()));
		assert!(matches!(err, LifecycleError::Storage(_)));
	}

	#[test]
	fn test_require_role() {
		assert!(require_role(&Actor::admin("a"), &[Role::Admin]).is_ok());
		let err = require_role(&Actor::customer("c"), &[Role::Admin, Role::Delivery]).unwrap_err();
		assert!(matches!(err, LifecycleError::Authorization(_)));
	}

	#[test]
	fn test_api_error_mapping() {
		let api = APIError::from(LifecycleError::Validation("items must not be empty".into()));
		assert_eq!(api.status_code(), 400);
		assert_eq!(api.to_error_response().error, "VALIDATION_ERROR");

		let api = APIError::from(LifecycleError::InvalidTransition {
			from: OrderStatus::Pending,
			to: OrderStatus::Shipped,
		});
		assert_eq!(api.status_code(), 409);
		let body = api.to_error_response();
		assert_eq!(body.error, "INVALID_TRANSITION");
		assert_eq!(body.details.unwrap()["to"], "Shipped");

		let api = APIError::from(LifecycleError::Authorization("no".into()));
		assert_eq!(api.status_code(), 403);
		let api = APIError::from(LifecycleError::Storage("disk".into()));
		assert_eq!(api.status_code(), 500);
	}
}
