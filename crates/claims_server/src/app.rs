//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates store
//! opening, cache loading, monitoring, the operator console and shutdown.

use crate::config::{AppConfig, StorageBackend};
use crate::console::run_console;
use crate::logging::display_banner;
use crate::signals::{wait_for_shutdown, wait_for_shutdown_silent};
use claims_core::RegionStore;
use claims_store::{JsonFileRegionStore, MemoryRegionStore};
use plugin_claims::{ClaimsPlugin, RegionService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Main application struct.
///
/// Owns the validated configuration and the claims plugin built on the
/// configured store.
pub struct Application {
    config: AppConfig,
    plugin: ClaimsPlugin,
}

impl Application {
    /// Opens the configured region store and builds the plugin on top of it.
    ///
    /// `config` must already carry CLI overrides and have passed validation.
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        display_banner();

        let store = open_store(&config).await?;
        let plugin = ClaimsPlugin::new(store, config.claims);

        info!(
            "🚀 {} v{} starting",
            plugin.name(),
            plugin.version()
        );
        Ok(Self { config, plugin })
    }

    /// Runs until a shutdown signal arrives.
    ///
    /// Loads the region cache, starts the monitoring and console tasks, waits
    /// for SIGINT/SIGTERM and then shuts the plugin down.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Claims Server Application");
        self.log_configuration_summary();

        self.plugin.on_init().await?;
        let service = self.plugin.service();

        let monitoring_handle = spawn_monitoring(
            Arc::clone(&service),
            self.config.monitoring.stats_interval_secs,
        );
        let console_handle = tokio::spawn(run_console(Arc::clone(&service)));

        info!("✅ Claims Server is now running!");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        wait_for_shutdown().await?;

        // A second signal skips the graceful path
        tokio::spawn(async move {
            if let Err(e) = wait_for_shutdown_silent().await {
                error!("Failed to set up forced shutdown signal handler: {e}");
                return;
            }
            warn!("Shutdown signal received again, exiting immediately");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        console_handle.abort();
        if let Some(handle) = monitoring_handle {
            handle.abort();
        }

        if let Err(e) = self.plugin.on_shutdown().await {
            error!("❌ Plugin shutdown failed: {}", e);
        }

        info!("✅ Claims Server shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        match self.config.storage.backend {
            StorageBackend::Json => info!("  💾 Store: {}", self.config.storage.path),
            StorageBackend::Memory => info!("  💾 Store: memory (not persisted)"),
        }
        info!(
            "  📐 Claim size: default {}, max {}",
            self.config.claims.default_size, self.config.claims.max_size
        );
        info!(
            "  🏷️ Max name length: {}",
            self.config.claims.max_name_length
        );
    }
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn RegionStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn RegionStore> = match config.storage.backend {
        StorageBackend::Json => Arc::new(JsonFileRegionStore::open(config.storage_path()).await?),
        StorageBackend::Memory => {
            warn!("💾 Using the in-memory region store; claims will not survive a restart");
            Arc::new(MemoryRegionStore::new())
        }
    };
    Ok(store)
}

/// Logs cache statistics every `interval_secs`. Returns `None` when disabled.
fn spawn_monitoring(
    service: Arc<RegionService>,
    interval_secs: u64,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval_secs == 0 {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        let mut last_queries = 0u64;

        loop {
            interval.tick().await;
            let stats = service.stats().await;
            let queries = stats.index.total_queries.saturating_sub(last_queries);
            last_queries = stats.index.total_queries;

            info!(
                "📊 Claims - {} regions ({} indexed) | {} memberships | {} lookups in the last {}s",
                stats.regions, stats.bounded_regions, stats.memberships, queries, interval_secs
            );
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_application_opens_json_store() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.path = dir.path().join("regions.json").display().to_string();

        let app = Application::new(config).await.unwrap();
        app.plugin.on_init().await.unwrap();
        assert_eq!(app.plugin.service().stats().await.regions, 0);
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;

        let store = open_store(&config).await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_monitoring_disabled_at_zero() {
        let service = Arc::new(RegionService::new(
            Arc::new(MemoryRegionStore::new()),
            Default::default(),
        ));
        assert!(spawn_monitoring(service, 0).is_none());
    }
}
