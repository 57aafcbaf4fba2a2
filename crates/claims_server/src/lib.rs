//! # Claims Server - Main Entry Point
//!
//! Land claim protection server. Loads every claimed region into memory at
//! startup, answers block permission checks from the cache and accepts
//! operator commands on stdin.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! claims-server
//!
//! # Specify custom configuration
//! claims-server --config production.toml
//!
//! # Override specific settings
//! claims-server --store /srv/claims/regions.json --log-level debug
//!
//! # JSON logging for production
//! claims-server --json-logs
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! The server shuts down gracefully on SIGINT (Ctrl+C) and SIGTERM (Unix).
//! A second signal exits immediately.

use tracing::error;

mod app;
pub mod cli;
pub mod config;
pub mod console;
pub mod logging;
pub mod signals;

use app::Application;
use cli::CliArgs;
use config::{AppConfig, StorageBackend};

pub use config::{LoggingSettings, MonitoringSettings, StorageSettings};

/// Runs the claims server.
///
/// 1. Parse command-line arguments
/// 2. Load configuration and apply CLI overrides
/// 3. Validate configuration and initialize logging
/// 4. Create and run the application
///
/// Exits the process with code 1 on startup or runtime failure.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config = match load_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(config).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Loads the config file, applies CLI overrides and validates the result.
pub async fn load_config(args: &CliArgs) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load_from_file(&args.config_path).await?;
    apply_overrides(&mut config, args);
    config
        .validate()
        .map_err(|e| format!("Configuration validation failed: {e}"))?;
    Ok(config)
}

fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(store_path) = &args.store_path {
        config.storage.backend = StorageBackend::Json;
        config.storage.path = store_path.to_string_lossy().to_string();
    }

    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }

    if args.json_logs {
        config.logging.json_format = true;
    }
}
