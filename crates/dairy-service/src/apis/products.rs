//! Product catalog endpoints.
//!
//! Anyone authenticated may browse active products; admins see the whole
//! catalog and are the only ones allowed to change it.

use super::{reject, require_role};
use crate::auth::Authenticated;
use crate::server::AppState;
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use dairy_types::{APIError, NewProduct, Product, ProductPatch, Role, StockUpdateRequest};

/// Handles GET /api/products.
pub async fn list(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
) -> Result<Json<Vec<Product>>, APIError> {
	let active_only = actor.role != Role::Admin;
	let products = state
		.engine
		.products()
		.list(active_only)
		.await
		.map_err(reject("list_products"))?;
	Ok(Json(products))
}

/// Handles POST /api/products.
pub async fn create(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Json(new_product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), APIError> {
	require_role(&actor, &[Role::Admin])?;
	let product = state
		.engine
		.products()
		.create(new_product)
		.await
		.map_err(reject("create_product"))?;
	Ok((StatusCode::CREATED, Json(product)))
}

/// Handles PUT /api/products/{id}.
pub async fn update(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let product = state
		.engine
		.products()
		.update(&id, patch)
		.await
		.map_err(reject("update_product"))?;
	Ok(Json(product))
}

/// Handles DELETE /api/products/{id}.
pub async fn delete(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
) -> Result<StatusCode, APIError> {
	require_role(&actor, &[Role::Admin])?;
	state
		.engine
		.products()
		.delete(&id)
		.await
		.map_err(reject("delete_product"))?;
	Ok(StatusCode::NO_CONTENT)
}

/// Handles PATCH /api/products/{id}/stock.
pub async fn set_stock(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Json(request): Json<StockUpdateRequest>,
) -> Result<Json<Product>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let product = state
		.engine
		.products()
		.set_stock(&id, request.stock_count)
		.await
		.map_err(reject("set_stock"))?;
	Ok(Json(product))
}

#[cfg(test)]
mod tests {
	use crate::server::tests::{TestApp, ADMIN, CAROL};
	use axum::http::StatusCode;
	use serde_json::json;

	#[tokio::test]
	async fn test_catalog_crud() {
		let app = TestApp::new().await;
		let (status, body) = app
			.send(
				"POST",
				"/api/products",
				Some(ADMIN),
				Some(json!({ "name": "Greek Yogurt", "price": "4.75", "category": "Yogurt" })),
			)
			.await;
		assert_eq!(status, StatusCode::CREATED);
		let id = body["id"].as_str().unwrap().to_string();
		assert_eq!(body["stockCount"], 0);

		let (status, body) = app
			.send(
				"PATCH",
				&format!("/api/products/{}/stock", id),
				Some(ADMIN),
				Some(json!({ "stockCount": 12 })),
			)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["stockCount"], 12);

		let (status, body) = app
			.send(
				"PUT",
				&format!("/api/products/{}", id),
				Some(ADMIN),
				Some(json!({ "price": "5.00", "isActive": false })),
			)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["price"], "5.00");

		let (_, body) = app.send("GET", "/api/products", Some(CAROL), None).await;
		assert!(body.as_array().unwrap().is_empty());
		let (_, body) = app.send("GET", "/api/products", Some(ADMIN), None).await;
		assert_eq!(body.as_array().unwrap().len(), 1);

		let (status, _) = app
			.send("DELETE", &format!("/api/products/{}", id), Some(ADMIN), None)
			.await;
		assert_eq!(status, StatusCode::NO_CONTENT);
		let (status, _) = app
			.send("DELETE", &format!("/api/products/{}", id), Some(ADMIN), None)
			.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_catalog_validation_and_roles() {
		let app = TestApp::new().await;
		let (status, body) = app
			.send(
				"POST",
				"/api/products",
				Some(ADMIN),
				Some(json!({ "name": "Free Milk", "price": "0" })),
			)
			.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "VALIDATION_ERROR");

		let (status, _) = app
			.send(
				"POST",
				"/api/products",
				Some(CAROL),
				Some(json!({ "name": "Cream", "price": "2.00" })),
			)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
	}
}
