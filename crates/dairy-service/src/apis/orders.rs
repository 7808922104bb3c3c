//! Order endpoints: placement, listing, cancellation, status changes and
//! assignment.

use super::{reject, require_role};
use crate::auth::Authenticated;
use crate::server::AppState;
use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Json,
};
use dairy_types::{
	APIError, AssignRequest, CreateOrderRequest, ListOrdersQuery, Order, OrderFilter, Role,
	UpdateStatusRequest,
};
use serde::Deserialize;

/// Which of a courier's orders to list.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryScope {
	#[default]
	All,
	Active,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryOrdersQuery {
	#[serde(default)]
	pub status: DeliveryScope,
}

/// Handles POST /api/orders.
pub async fn create_order(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	let order = state
		.engine
		.place_order(&actor, request)
		.await
		.map_err(reject("create_order"))?;
	Ok((StatusCode::CREATED, Json(order)))
}

/// Handles GET /api/orders. Admin only.
pub async fn list_orders(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let filter = OrderFilter {
		status: query.status,
		customer_id: query.customer_id,
		assigned_delivery_id: query.delivery_id,
	};
	let orders = state
		.engine
		.orders()
		.list_orders(&filter)
		.await
		.map_err(reject("list_orders"))?;
	Ok(Json(orders))
}

/// Handles GET /api/orders/my-orders.
pub async fn my_orders(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
) -> Result<Json<Vec<Order>>, APIError> {
	require_role(&actor, &[Role::Customer])?;
	let orders = state
		.engine
		.orders()
		.list_orders(&OrderFilter::by_customer(actor.id))
		.await
		.map_err(reject("my_orders"))?;
	Ok(Json(orders))
}

/// Handles GET /api/orders/delivery?status=all|active.
pub async fn delivery_orders(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Query(query): Query<DeliveryOrdersQuery>,
) -> Result<Json<Vec<Order>>, APIError> {
	require_role(&actor, &[Role::Delivery])?;
	let orders = match query.status {
		DeliveryScope::All => {
			state
				.engine
				.orders()
				.list_orders(&OrderFilter::by_delivery(actor.id))
				.await
		},
		DeliveryScope::Active => state.engine.stats().active_orders(&actor.id).await,
	}
	.map_err(reject("delivery_orders"))?;
	Ok(Json(orders))
}

/// Handles GET /api/orders/{id}.
pub async fn get_order(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
) -> Result<Json<Order>, APIError> {
	let order = state
		.engine
		.orders()
		.get_order_for(&actor, &id)
		.await
		.map_err(reject("get_order"))?;
	Ok(Json(order))
}

/// Handles POST /api/orders/{id}/cancel.
pub async fn cancel_order(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
) -> Result<Json<Order>, APIError> {
	let order = state
		.engine
		.orders()
		.cancel_order(&id, &actor)
		.await
		.map_err(reject("cancel_order"))?;
	Ok(Json(order))
}

/// Handles PUT /api/orders/{id}/status.
pub async fn update_status(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, APIError> {
	let order = state
		.engine
		.transitions()
		.transition(&id, request.status, &actor)
		.await
		.map_err(reject("update_status"))?;
	Ok(Json(order))
}

/// Handles PUT /api/orders/{id}/assign.
pub async fn assign_order(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Json(request): Json<AssignRequest>,
) -> Result<Json<Order>, APIError> {
	let order = state
		.engine
		.assignments()
		.assign(&actor, &id, &request.delivery_id)
		.await
		.map_err(reject("assign_order"))?;
	Ok(Json(order))
}

/// Handles PUT /api/orders/{id}/reassign.
pub async fn reassign_order(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Json(request): Json<AssignRequest>,
) -> Result<Json<Order>, APIError> {
	let order = state
		.engine
		.assignments()
		.reassign(&actor, &id, &request.delivery_id)
		.await
		.map_err(reject("reassign_order"))?;
	Ok(Json(order))
}

#[cfg(test)]
mod tests {
	use crate::server::tests::{TestApp, ADMIN, CAROL, DORA, EVE};
	use axum::http::StatusCode;
	use dairy_types::Role;
	use serde_json::json;

	#[tokio::test]
	async fn test_place_order_computes_totals() {
		let app = TestApp::new().await;
		let butter = app.product("Farm Butter", "25.00").await;
		let id = app.place_order(&butter, 2).await;

		let (status, body) = app
			.send("GET", &format!("/api/orders/{}", id), Some(CAROL), None)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "Pending");
		assert_eq!(body["subtotal"], "50.00");
		assert_eq!(body["totalPrice"], "55.00");
		assert_eq!(body["items"][0]["productName"], "Farm Butter");
		assert!(body["orderNumber"].as_str().unwrap().starts_with("ORD-"));
		assert!(body.get("assignedDeliveryId").is_none_or(|v| v.is_null()));
	}

	#[tokio::test]
	async fn test_place_order_validation() {
		let app = TestApp::new().await;
		let (status, body) = app
			.send(
				"POST",
				"/api/orders",
				Some(CAROL),
				Some(json!({ "items": [], "deliveryLocation": "12 Dairy Lane" })),
			)
			.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "VALIDATION_ERROR");

		let (status, body) = app
			.send(
				"POST",
				"/api/orders",
				Some(CAROL),
				Some(json!({
					"items": [{ "productId": "missing", "quantity": 1 }],
					"deliveryLocation": "12 Dairy Lane",
				})),
			)
			.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "VALIDATION_ERROR");
	}

	#[tokio::test]
	async fn test_only_customers_place_orders() {
		let app = TestApp::new().await;
		let milk = app.product("Whole Milk", "3.20").await;
		let (status, body) = app
			.send(
				"POST",
				"/api/orders",
				Some(ADMIN),
				Some(json!({
					"items": [{ "productId": milk.id, "quantity": 1 }],
					"deliveryLocation": "HQ",
				})),
			)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["error"], "FORBIDDEN");
	}

	#[tokio::test]
	async fn test_assign_and_deliver_flow() {
		let app = TestApp::new().await;
		let butter = app.product("Farm Butter", "25.00").await;
		let id = app.place_order(&butter, 2).await;

		let (status, _) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/assign", id),
				Some(CAROL),
				Some(json!({ "deliveryId": "dora" })),
			)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		let (status, body) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/assign", id),
				Some(ADMIN),
				Some(json!({ "deliveryPersonId": "dora" })),
			)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "Processing");
		assert_eq!(body["assignedDeliveryId"], "dora");

		let (status, body) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/assign", id),
				Some(ADMIN),
				Some(json!({ "deliveryId": "eve" })),
			)
			.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "INVALID_STATE");

		// Only the assigned courier may drive delivery.
		let (status, _) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/status", id),
				Some(EVE),
				Some(json!({ "status": "Shipped" })),
			)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		for target in ["Shipped", "Delivered"] {
			let (status, body) = app
				.send(
					"PUT",
					&format!("/api/orders/{}/status", id),
					Some(DORA),
					Some(json!({ "status": target })),
				)
				.await;
			assert_eq!(status, StatusCode::OK, "{}", body);
			assert_eq!(body["status"], target);
		}

		let (status, body) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/status", id),
				Some(ADMIN),
				Some(json!({ "status": "Shipped" })),
			)
			.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "INVALID_TRANSITION");
		assert_eq!(body["details"]["from"], "Delivered");

		let (_, body) = app
			.send("GET", &format!("/api/orders/{}", id), Some(DORA), None)
			.await;
		assert!(body["deliveryCompletedAt"].is_string());
	}

	#[tokio::test]
	async fn test_assign_to_inactive_courier_keeps_order_pending() {
		let app = TestApp::new().await;
		let butter = app.product("Farm Butter", "25.00").await;
		let id = app.place_order(&butter, 1).await;
		app.engine.users().set_active("eve", false).await.unwrap();

		let (status, body) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/assign", id),
				Some(ADMIN),
				Some(json!({ "deliveryId": "eve" })),
			)
			.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "VALIDATION_ERROR");

		let (_, body) = app
			.send("GET", &format!("/api/orders/{}", id), Some(ADMIN), None)
			.await;
		assert_eq!(body["status"], "Pending");

		let (status, _) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/assign", id),
				Some(ADMIN),
				Some(json!({ "deliveryId": "nobody" })),
			)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_reassign() {
		let app = TestApp::new().await;
		let butter = app.product("Farm Butter", "25.00").await;
		let id = app.place_order(&butter, 1).await;

		let (status, body) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/reassign", id),
				Some(ADMIN),
				Some(json!({ "deliveryId": "eve" })),
			)
			.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "INVALID_STATE");

		app.send(
			"PUT",
			&format!("/api/orders/{}/assign", id),
			Some(ADMIN),
			Some(json!({ "deliveryId": "dora" })),
		)
		.await;
		let (status, body) = app
			.send(
				"PUT",
				&format!("/api/orders/{}/reassign", id),
				Some(ADMIN),
				Some(json!({ "deliveryId": "eve" })),
			)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["assignedDeliveryId"], "eve");
		assert_eq!(body["status"], "Processing");
	}

	#[tokio::test]
	async fn test_cancel_rules() {
		let app = TestApp::new().await;
		let butter = app.product("Farm Butter", "25.00").await;
		let first = app.place_order(&butter, 1).await;
		let second = app.place_order(&butter, 1).await;

		let (status, _) = app
			.send("POST", &format!("/api/orders/{}/cancel", first), Some(DORA), None)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		let (status, body) = app
			.send("POST", &format!("/api/orders/{}/cancel", first), Some(CAROL), None)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "Cancelled");

		app.send(
			"PUT",
			&format!("/api/orders/{}/assign", second),
			Some(ADMIN),
			Some(json!({ "deliveryId": "dora" })),
		)
		.await;
		let (status, body) = app
			.send("POST", &format!("/api/orders/{}/cancel", second), Some(CAROL), None)
			.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "INVALID_TRANSITION");
	}

	#[tokio::test]
	async fn test_listings_are_scoped_by_role() {
		let app = TestApp::new().await;
		let butter = app.product("Farm Butter", "25.00").await;
		let mine = app.place_order(&butter, 1).await;
		let assigned = app.place_order(&butter, 1).await;
		app.send(
			"PUT",
			&format!("/api/orders/{}/assign", assigned),
			Some(ADMIN),
			Some(json!({ "deliveryId": "dora" })),
		)
		.await;

		let (status, _) = app.send("GET", "/api/orders", Some(CAROL), None).await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		let (status, body) = app.send("GET", "/api/orders", Some(ADMIN), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body.as_array().unwrap().len(), 2);

		let (_, body) = app
			.send("GET", "/api/orders?status=Pending", Some(ADMIN), None)
			.await;
		let pending = body.as_array().unwrap();
		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0]["id"], mine.as_str());

		let (_, body) = app
			.send("GET", "/api/orders?deliveryId=dora", Some(ADMIN), None)
			.await;
		assert_eq!(body.as_array().unwrap().len(), 1);

		let (status, body) = app.send("GET", "/api/orders/my-orders", Some(CAROL), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body.as_array().unwrap().len(), 2);

		let (status, body) = app
			.send("GET", "/api/orders/delivery?status=active", Some(DORA), None)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body.as_array().unwrap()[0]["id"], assigned.as_str());

		let (_, body) = app.send("GET", "/api/orders/delivery", Some(EVE), None).await;
		assert!(body.as_array().unwrap().is_empty());

		let (status, _) = app
			.send("GET", &format!("/api/orders/{}", mine), Some(EVE), None)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		let (status, body) = app
			.send("GET", "/api/orders/does-not-exist", Some(ADMIN), None)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "NOT_FOUND");
	}

	#[tokio::test]
	async fn test_seeded_identities_have_roles() {
		let app = TestApp::new().await;
		let dora = app.engine.users().get("dora").await.unwrap();
		assert_eq!(dora.role, Role::Delivery);
		assert!(dora.is_active);
	}
}
