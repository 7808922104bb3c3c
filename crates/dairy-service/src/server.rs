//! HTTP server for the dairy service API.
//!
//! All endpoints live under `/api`. Handlers resolve the caller through the
//! bearer token extractor and delegate to the engine; domain errors become
//! structured JSON errors through `APIError`.

use crate::apis::{delivery, orders, products, stats, users};
use crate::auth::{IdentityProvider, StaticTokenProvider};
use axum::{
	extract::{DefaultBodyLimit, State},
	http::{HeaderName, HeaderValue, Method},
	response::Json,
	routing::{get, patch, post, put},
	Router,
};
use dairy_config::{ApiConfig, CorsConfig};
use dairy_core::DairyEngine;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// The order lifecycle engine serving every request.
	pub engine: Arc<DairyEngine>,
	/// Resolves bearer tokens to callers.
	pub identity: Arc<dyn IdentityProvider>,
}

/// Starts the HTTP server and runs it until Ctrl-C.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<DairyEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let identity = Arc::new(StaticTokenProvider::from_config(&engine.config().auth));
	let app = build_router(AppState { engine, identity }, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Dairy API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal");
		return;
	}
	tracing::info!("Shutdown signal received");
}

/// Builds the `/api` router with tracing, CORS, body size and timeout layers.
pub fn build_router(state: AppState, api_config: &ApiConfig) -> Router {
	let api = Router::new()
		.route("/health", get(health))
		.route("/orders", post(orders::create_order).get(orders::list_orders))
		.route("/orders/my-orders", get(orders::my_orders))
		.route("/orders/delivery", get(orders::delivery_orders))
		.route("/orders/{id}", get(orders::get_order))
		.route("/orders/{id}/cancel", post(orders::cancel_order))
		.route("/orders/{id}/status", put(orders::update_status))
		.route("/orders/{id}/assign", put(orders::assign_order))
		.route("/orders/{id}/reassign", put(orders::reassign_order))
		.route("/delivery/personnel", get(delivery::personnel))
		.route("/delivery/available", get(delivery::available))
		.route("/delivery/stats/{id}", get(delivery::delivery_stats))
		.route("/delivery/{id}/earnings", get(delivery::earnings))
		.route("/delivery/{id}/active", get(delivery::active_orders))
		.route("/stats/platform", get(stats::platform))
		.route("/stats/recent-orders", get(stats::recent_orders))
		.route("/users", post(users::register).get(users::list))
		.route("/users/{id}", put(users::update).delete(users::delete))
		.route("/users/{id}/active", put(users::set_active))
		.route("/products", get(products::list).post(products::create))
		.route("/products/{id}", put(products::update).delete(products::delete))
		.route("/products/{id}/stock", patch(products::set_stock));

	Router::new()
		.nest("/api", api)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(api_config.cors.as_ref()))
				.layer(TimeoutLayer::new(Duration::from_secs(api_config.timeout_seconds)))
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(state)
}

/// Permissive when no `[api.cors]` section is configured.
fn cors_layer(cors: Option<&CorsConfig>) -> CorsLayer {
	let Some(cors) = cors else {
		return CorsLayer::permissive();
	};

	let mut layer = CorsLayer::new();
	if cors.allowed_origins.iter().any(|o| o == "*") {
		layer = layer.allow_origin(Any);
	} else {
		let origins: Vec<HeaderValue> = cors
			.allowed_origins
			.iter()
			.filter_map(|o| match o.parse() {
				Ok(origin) => Some(origin),
				Err(_) => {
					tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
					None
				},
			})
			.collect();
		layer = layer.allow_origin(origins);
	}

	let methods: Vec<Method> = cors
		.allowed_methods
		.iter()
		.filter_map(|m| m.parse().ok())
		.collect();
	if !methods.is_empty() {
		layer = layer.allow_methods(methods);
	}

	let headers: Vec<HeaderName> = cors
		.allowed_headers
		.iter()
		.filter_map(|h| h.parse().ok())
		.collect();
	if !headers.is_empty() {
		layer = layer.allow_headers(headers);
	}
	layer
}

/// Handles GET /api/health.
async fn health(State(state): State<AppState>) -> Json<Value> {
	Json(json!({
		"status": "ok",
		"service": state.engine.config().service.id,
	}))
}
