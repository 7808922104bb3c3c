//! Bearer token authentication.
//!
//! Every `/api` route except the health probe requires an
//! `Authorization: Bearer <token>` header. Tokens are resolved to an
//! [`Actor`] by an [`IdentityProvider`]; the bundled provider reads a static
//! table from the `[auth.tokens]` configuration section. The account behind
//! a token must still exist and be active, and its role is taken from the
//! user directory rather than the token table.

use crate::server::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use dairy_config::AuthConfig;
use dairy_core::LifecycleError;
use dairy_types::{APIError, Actor};
use std::collections::HashMap;

/// Resolves bearer tokens to acting identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Returns the identity bound to `token`, or `None` when it is unknown.
	async fn resolve(&self, token: &str) -> Option<Actor>;
}

/// Identity provider backed by the configured token table.
pub struct StaticTokenProvider {
	tokens: HashMap<String, Actor>,
}

impl StaticTokenProvider {
	pub fn from_config(auth: &AuthConfig) -> Self {
		let tokens = auth
			.tokens
			.iter()
			.map(|(token, identity)| {
				(
					token.clone(),
					Actor::new(identity.user_id.clone(), identity.role),
				)
			})
			.collect();
		Self { tokens }
	}
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
	async fn resolve(&self, token: &str) -> Option<Actor> {
		self.tokens.get(token).cloned()
	}
}

/// Extractor yielding the authenticated caller of a request.
pub struct Authenticated(pub Actor);

impl FromRequestParts<AppState> for Authenticated {
	type Rejection = APIError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let token = parts
			.headers
			.get(AUTHORIZATION)
			.and_then(|h| h.to_str().ok())
			.and_then(|h| h.strip_prefix("Bearer "))
			.map(str::trim)
			.filter(|t| !t.is_empty())
			.ok_or_else(|| APIError::Unauthorized {
				message: "No token provided".to_string(),
			})?;

		let Some(actor) = state.identity.resolve(token).await else {
			tracing::debug!("Rejected unknown bearer token");
			return Err(APIError::Unauthorized {
				message: "Invalid token".to_string(),
			});
		};

		let user = match state.engine.users().get(&actor.id).await {
			Ok(user) => user,
			Err(LifecycleError::NotFound { .. }) => {
				tracing::debug!(user_id = %actor.id, "Token bound to a removed account");
				return Err(APIError::Unauthorized {
					message: "Account no longer exists".to_string(),
				});
			},
			Err(e) => return Err(crate::apis::reject("authenticate")(e)),
		};
		if !user.is_active {
			tracing::debug!(user_id = %user.id, "Rejected token of inactive account");
			return Err(APIError::Unauthorized {
				message: "Account is inactive".to_string(),
			});
		}

		Ok(Authenticated(Actor::new(user.id, user.role)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use dairy_config::ConfigBuilder;
	use dairy_types::Role;

	#[tokio::test]
	async fn test_static_provider_resolves_configured_tokens() {
		let config = ConfigBuilder::new()
			.token("t-admin", "admin-1", Role::Admin)
			.token("t-dora", "dora", Role::Delivery)
			.build();
		let provider = StaticTokenProvider::from_config(&config.auth);

		assert_eq!(
			provider.resolve("t-dora").await,
			Some(Actor::delivery("dora"))
		);
		assert_eq!(
			provider.resolve("t-admin").await,
			Some(Actor::admin("admin-1"))
		);
		assert_eq!(provider.resolve("unknown").await, None);
	}

	#[tokio::test]
	async fn test_inactive_account_token_is_revoked() {
		use crate::server::tests::{TestApp, ADMIN, EVE};
		use axum::http::StatusCode;
		use serde_json::json;

		let app = TestApp::new().await;
		let (status, _) = app.send("GET", "/api/orders/delivery", Some(EVE), None).await;
		assert_eq!(status, StatusCode::OK);

		let (status, _) = app
			.send(
				"PUT",
				"/api/users/eve/active",
				Some(ADMIN),
				Some(json!({ "isActive": false })),
			)
			.await;
		assert_eq!(status, StatusCode::OK);

		let (status, body) = app.send("GET", "/api/orders/delivery", Some(EVE), None).await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(body["error"], "UNAUTHORIZED");

		app.engine.users().set_active("eve", true).await.unwrap();
		let (status, _) = app.send("GET", "/api/orders/delivery", Some(EVE), None).await;
		assert_eq!(status, StatusCode::OK);

		app.engine.users().delete("eve").await.unwrap();
		let (status, _) = app.send("GET", "/api/orders/delivery", Some(EVE), None).await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn test_role_comes_from_user_directory() {
		use crate::server::tests::{TestApp, ADMIN, CAROL};
		use axum::http::StatusCode;
		use dairy_types::UserPatch;

		let app = TestApp::new().await;
		let (status, _) = app.send("GET", "/api/users", Some(CAROL), None).await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		app.engine
			.users()
			.update(
				"carol",
				UserPatch {
					role: Some(Role::Admin),
					..UserPatch::default()
				},
			)
			.await
			.unwrap();
		let (status, _) = app.send("GET", "/api/users", Some(CAROL), None).await;
		assert_eq!(status, StatusCode::OK);

		let (status, _) = app.send("GET", "/api/users", Some(ADMIN), None).await;
		assert_eq!(status, StatusCode::OK);
	}
}
