//! Main entry point for the dairy delivery service.
//!
//! This binary loads the configuration, wires the storage backend into the
//! order lifecycle engine, seeds the identities declared in the auth table
//! and serves the REST API until interrupted.

use clap::Parser;
use dairy_config::Config;
use dairy_core::{DairyBuilder, DairyEngine, DairyFactories};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

mod apis;
mod auth;
mod server;

use dairy_storage::implementations::file::create_storage as create_file_storage;
use dairy_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the dairy service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started dairy service");

	let config_path = args.config.to_string_lossy().into_owned();
	let config = Config::from_file(&config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_engine(config.clone())?);
	engine.seed_identities().await?;
	let events = spawn_event_logger(&engine);

	let Some(api_config) = config.api.clone().filter(|api| api.enabled) else {
		tracing::warn!("API server disabled in configuration, nothing to serve");
		events.abort();
		return Ok(());
	};

	server::start_server(api_config, engine).await?;
	events.abort();

	tracing::info!("Stopped dairy service");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the engine with every storage backend this binary ships.
fn build_engine(config: Config) -> Result<DairyEngine, Box<dyn std::error::Error>> {
	let storage_factories = create_factory_map!(
		dairy_storage::StorageInterface,
		dairy_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	let factories = DairyFactories { storage_factories };
	Ok(DairyBuilder::new(config).build(factories)?)
}

/// Logs every order event published by the engine.
fn spawn_event_logger(engine: &DairyEngine) -> tokio::task::JoinHandle<()> {
	let mut receiver = engine.event_bus().subscribe();
	tokio::spawn(async move {
		loop {
			match receiver.recv().await {
				Ok(event) => {
					tracing::info!(order_id = %event.order_id(), event = ?event, "Order event");
				},
				Err(RecvError::Lagged(skipped)) => {
					tracing::warn!(skipped, "Event logger lagged behind");
				},
				Err(RecvError::Closed) => break,
			}
		}
	})
}
