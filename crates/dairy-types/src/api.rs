//! API types for the dairy service HTTP API.
//!
//! This module defines the request and response bodies of the REST endpoints
//! and the structured error type every handler returns.

use crate::{OrderStatus, PaymentMethod, PersonStats, TimeWindow, User};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A requested order line; name and price are resolved from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
	pub product_id: String,
	pub quantity: u32,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
	pub items: Vec<OrderLineRequest>,
	pub delivery_location: String,
	#[serde(default)]
	pub delivery_instructions: Option<String>,
	#[serde(default)]
	pub payment_method: PaymentMethod,
}

/// Body of `PUT /api/orders/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
	pub status: OrderStatus,
}

/// Body of `PUT /api/orders/{id}/assign` and `/reassign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
	#[serde(alias = "deliveryPersonId")]
	pub delivery_id: String,
}

/// Body of `PUT /api/users/{id}/active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
	pub is_active: bool,
}

/// Body of `PATCH /api/products/{id}/stock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateRequest {
	pub stock_count: u32,
}

/// Query string for `GET /api/orders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
	pub status: Option<OrderStatus>,
	pub customer_id: Option<String>,
	#[serde(alias = "assignedDeliveryId")]
	pub delivery_id: Option<String>,
}

/// Query string for stats and earnings endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowQuery {
	#[serde(default, alias = "period", alias = "timeRange")]
	pub window: TimeWindow,
}

/// A courier together with derived stats, as listed in the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelEntry {
	#[serde(flatten)]
	pub user: User,
	pub stats: PersonStats,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed or missing input (400)
	BadRequest { error_type: String, message: String },
	/// Missing or unknown credentials (401)
	Unauthorized { message: String },
	/// Caller lacks permission for the operation (403)
	Forbidden { message: String },
	/// Unknown identifier (404)
	NotFound { error_type: String, message: String },
	/// Request conflicts with the current state of the resource (409)
	Conflict {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Internal server error (500)
	InternalServerError { message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Unauthorized { .. } => 401,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error, message, details) = match self {
			APIError::BadRequest { error_type, message }
			| APIError::NotFound { error_type, message } => (error_type.as_str(), message, None),
			APIError::Unauthorized { message } => ("UNAUTHORIZED", message, None),
			APIError::Forbidden { message } => ("FORBIDDEN", message, None),
			APIError::Conflict {
				error_type,
				message,
				details,
			} => (error_type.as_str(), message, details.clone()),
			APIError::InternalServerError { message } => ("INTERNAL_ERROR", message, None),
		};
		ErrorResponse {
			error: error.to_string(),
			message: message.clone(),
			details,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
			APIError::Forbidden { message } => write!(f, "Forbidden: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::InternalServerError { message } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status =
			StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
