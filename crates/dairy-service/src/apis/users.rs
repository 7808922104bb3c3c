//! User directory endpoints. Admin only.

use super::{reject, require_role};
use crate::auth::Authenticated;
use crate::server::AppState;
use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Json,
};
use dairy_types::{APIError, NewUser, Role, SetActiveRequest, User, UserPatch};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
	pub role: Option<Role>,
}

/// Handles POST /api/users.
pub async fn register(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), APIError> {
	require_role(&actor, &[Role::Admin])?;
	let user = state
		.engine
		.users()
		.register(new_user)
		.await
		.map_err(reject("register_user"))?;
	Ok((StatusCode::CREATED, Json(user)))
}

/// Handles GET /api/users?role=.
pub async fn list(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let users = state
		.engine
		.users()
		.list(query.role)
		.await
		.map_err(reject("list_users"))?;
	Ok(Json(users))
}

/// Handles PUT /api/users/{id}.
pub async fn update(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Json(patch): Json<UserPatch>,
) -> Result<Json<User>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let user = state
		.engine
		.users()
		.update(&id, patch)
		.await
		.map_err(reject("update_user"))?;
	Ok(Json(user))
}

/// Handles DELETE /api/users/{id}.
pub async fn delete(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
) -> Result<StatusCode, APIError> {
	require_role(&actor, &[Role::Admin])?;
	state
		.engine
		.users()
		.delete(&id)
		.await
		.map_err(reject("delete_user"))?;
	Ok(StatusCode::NO_CONTENT)
}

/// Handles PUT /api/users/{id}/active.
pub async fn set_active(
	State(state): State<AppState>,
	Authenticated(actor): Authenticated,
	Path(id): Path<String>,
	Json(request): Json<SetActiveRequest>,
) -> Result<Json<User>, APIError> {
	require_role(&actor, &[Role::Admin])?;
	let user = state
		.engine
		.users()
		.set_active(&id, request.is_active)
		.await
		.map_err(reject("set_user_active"))?;
	Ok(Json(user))
}
