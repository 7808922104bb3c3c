//! Platform-wide stats endpoints. Admin only.

use super::{reject, require_role};
use crate::auth::Authenticated;
use crate::server::AppState;
use axum::{
	extract::{Query, State},
	response::Json,
};
use dairy_types::{APIError, Order, PlatformStats, Role, WindowQuery};
use serde::Deserialize;

const DEFAULT_RECENT_LIMIT: usize = 10;
const MAX_RECENT_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecentOrdersQuery {
	pub limit: Option<usize>,
}

/// Handles GET /api/stats/platform?window=.
pub async fn platform(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Query(query): Query<WindowQuery>,
) -> Result<Json<PlatformStats>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let stats = state
		.engine
		.stats()
		.platform_stats(query.window)
		.await
		.map_err(reject("platform_stats"))?;
	Ok(Json(stats))
}

/// Handles GET /api/stats/recent-orders?limit=.
pub async fn recent_orders(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Query(query): Query<RecentOrdersQuery>,
) -> Result<Json<Vec<Order>>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let limit = query
		.limit
		.unwrap_or(DEFAULT_RECENT_LIMIT)
		.min(MAX_RECENT_LIMIT);
	let orders = state
		.engine
		.stats()
		.recent_orders(limit)
		.await
		.map_err(reject("recent_orders"))?;
	Ok(Json(orders))
}

#[cfg(test)]
mod tests {
	use crate::server::tests::{TestApp, ADMIN, CAROL};
	use axum::http::StatusCode;

	#[tokio::test]
	async fn test_platform_stats() {
		let app = TestApp::new().await;
		let butter = app.product("Farm Butter", "25.00").await;
		let first = app.place_order(&butter, 2).await;
		app.place_order(&butter, 1).await;
		app.send("POST", &format!("/api/orders/{}/cancel", first), Some(CAROL), None)
			.await;

		let (status, body) = app
			.send("GET", "/api/stats/platform?window=month", Some(ADMIN), None)
			.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["totalOrders"], 2);
		// Cancelled orders still count toward revenue.
		assert_eq!(body["totalRevenue"], "85.00");
		assert_eq!(body["pendingOrders"], 1);
		assert_eq!(body["activeUserCount"], 4);

		let (status, _) = app
			.send("GET", "/api/stats/platform", Some(CAROL), None)
			.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn test_recent_orders_limit() {
		let app = TestApp::new().await;
		let butter = app.product("Farm Butter", "25.00").await;
		for _ in 0..3 {
			app.place_order(&butter, 1).await;
		}

		let (status, body) = app
			.send("GET", "/api/stats/recent-orders?limit=2", Some(ADMIN), None)
			.await;
		assert_eq!(status, StatusCode::OK);
		let orders = body.as_array().unwrap();
		assert_eq!(orders.len(), 2);
	}
}
