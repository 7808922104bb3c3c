//! Delivery roster endpoints and per-courier stats.

use super::{reject, require_admin_or_self, require_role};
use crate::auth::Authenticated;
use crate::server::AppState;
use axum::{
	extract::{Path, Query, State},
	response::Json,
};
use dairy_types::{
	APIError, DeliveryStats, EarningsReport, Order, PersonnelEntry, Role, User, WindowQuery,
};

/// Handles GET /api/delivery/personnel. Admin only.
pub async fn personnel(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
) -> Result<Json<Vec<PersonnelEntry>>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let entries = state
		.engine
		.stats()
		.personnel()
		.await
		.map_err(reject("personnel"))?;
	Ok(Json(entries))
}

/// Handles GET /api/delivery/available. Admin only.
pub async fn available(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
) -> Result<Json<Vec<User>>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let users = state
		.engine
		.users()
		.available()
		.await
		.map_err(reject("available"))?;
	Ok(Json(users))
}

/// Handles GET /api/delivery/stats/{id}?window=.
pub async fn delivery_stats(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Query(query): Query<WindowQuery>,
) -> Result<Json<DeliveryStats>, APIError> {
	require_admin_or_self(&actor, &id)?;
	state
		.engine
		.users()
		.get(&id)
		.await
		.map_err(reject("delivery_stats"))?;
	let stats = state
		.engine
		.stats()
		.delivery_stats(&id, query.window)
		.await
		.map_err(reject("delivery_stats"))?;
	Ok(Json(stats))
}

/// Handles GET /api/delivery/{id}/earnings?period=.
pub async fn earnings(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Query(query): Query<WindowQuery>,
) -> Result<Json<EarningsReport>, APIError> {
	require_admin_or_self(&actor, &id)?;
	let report = state
		.engine
		.stats()
		.earnings(&id, query.window)
		.await
		.map_err(reject("earnings"))?;
	Ok(Json(report))
}

/// Handles GET /api/delivery/{id}/active.
pub async fn active_orders(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
) -> Result<Json<Vec<Order>>, APIError> {
	require_admin_or_self(&actor, &id)?;
	let orders = state
		.engine
		.stats()
		.active_orders(&id)
		.await
		.map_err(reject("active_orders"))?;
	Ok(Json(orders))
}
