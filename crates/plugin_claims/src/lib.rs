//! # Claims Plugin
//!
//! Land claim protection for the game server. Players claim a cube of blocks
//! around themselves; inside it, only the owner and the members they add may
//! break, place or open containers, unless the owner opens that up with flags.
//!
//! ## Overview
//!
//! - **Claim lifecycle**: create, delete, resize, flag and member changes go
//!   through [`RegionService`], which writes the store and mirrors the cache
//! - **Event checks**: block break/place, container open and world effects are
//!   answered from the in-memory cache by the [`handlers`]
//! - **Anchor removal**: an owner breaking the center block of their claim
//!   deletes the claim
//!
//! ## Events
//!
//! | Event            | Payload                 | Checked with        |
//! |------------------|-------------------------|---------------------|
//! | `block_break`    | [`BlockBreakEvent`]     | `can_break`         |
//! | `block_place`    | [`BlockPlaceEvent`]     | `can_place`         |
//! | `container_open` | [`ContainerOpenEvent`]  | `can_open_chests`   |
//! | `world_effect`   | [`WorldEffectEvent`]    | the effect's flag   |
//!
//! ## Example Usage
//!
//! ```rust
//! use plugin_claims::{ClaimRules, ClaimsPlugin};
//! use claims_store::MemoryRegionStore;
//! use std::sync::Arc;
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! runtime.block_on(async {
//!     let plugin = ClaimsPlugin::new(Arc::new(MemoryRegionStore::new()), ClaimRules::default());
//!     plugin.on_init().await.unwrap();
//!
//!     let decision = plugin
//!         .handle_event(
//!             "block_place",
//!             serde_json::json!({
//!                 "player": "bob",
//!                 "world": "overworld",
//!                 "position": { "x": 0, "y": 64, "z": 0 }
//!             }),
//!         )
//!         .await
//!         .unwrap();
//!     assert!(decision.is_allowed());
//! });
//! ```
//!
//! ## Module Organization
//!
//! - [`service`] - Claim lifecycle operations and the shared cache handle
//! - [`events`] - Event payloads and decisions
//! - [`handlers`] - Per-event permission checks
//! - [`error`] - Error types

pub mod error;
pub mod events;
pub mod handlers;
pub mod service;

pub use error::{PluginError, ServiceError};
pub use events::{
    BlockBreakEvent, BlockPlaceEvent, ContainerOpenEvent, Decision, Location, WorldEffect,
    WorldEffectEvent,
};
pub use service::{ClaimRequest, ClaimRules, RegionService, SharedRegionCache};

use claims_core::RegionStore;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};


/// Land claim protection plugin.
///
/// Bundles the [`RegionService`] with the host-facing lifecycle and event
/// entry points. Clone the service handle to run operator commands alongside
/// event processing.
pub struct ClaimsPlugin {
    name: String,
    service: Arc<RegionService>,
}

impl ClaimsPlugin {
    pub fn new(store: Arc<dyn RegionStore>, rules: ClaimRules) -> Self {
        debug!("🏠 ClaimsPlugin: Creating new instance");
        Self {
            name: "ClaimsPlugin".to_string(),
            service: Arc::new(RegionService::new(store, rules)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn service(&self) -> Arc<RegionService> {
        Arc::clone(&self.service)
    }

    /// Loads every region into the cache. Must complete before events are handled.
    pub async fn on_init(&self) -> Result<(), PluginError> {
        let count = self.service.load().await?;
        info!("🏠 {}: Protecting {} regions", self.name, count);
        Ok(())
    }

    /// Logs final cache statistics.
    pub async fn on_shutdown(&self) -> Result<(), PluginError> {
        let stats = self.service.stats().await;
        info!(
            "🏠 {}: Shutting down with {} regions, {} memberships, {} spatial queries served",
            self.name, stats.regions, stats.memberships, stats.index.total_queries
        );
        Ok(())
    }

    pub async fn on_block_break(&self, event: &BlockBreakEvent) -> Result<Decision, PluginError> {
        self.ensure_loaded().await?;
        Ok(handlers::handle_block_break(&self.service, event).await?)
    }

    pub async fn on_block_place(&self, event: &BlockPlaceEvent) -> Result<Decision, PluginError> {
        self.ensure_loaded().await?;
        Ok(handlers::handle_block_place(&self.service.cache(), event).await)
    }

    pub async fn on_container_open(
        &self,
        event: &ContainerOpenEvent,
    ) -> Result<Decision, PluginError> {
        self.ensure_loaded().await?;
        Ok(handlers::handle_container_open(&self.service.cache(), event).await)
    }

    pub async fn on_world_effect(&self, event: &WorldEffectEvent) -> Result<Decision, PluginError> {
        self.ensure_loaded().await?;
        Ok(handlers::handle_world_effect(&self.service.cache(), event).await)
    }

    /// Routes a named JSON event to its handler.
    pub async fn handle_event(
        &self,
        event_name: &str,
        payload: serde_json::Value,
    ) -> Result<Decision, PluginError> {
        match event_name {
            "block_break" => self.on_block_break(&parse(event_name, payload)?).await,
            "block_place" => self.on_block_place(&parse(event_name, payload)?).await,
            "container_open" => self.on_container_open(&parse(event_name, payload)?).await,
            "world_effect" => self.on_world_effect(&parse(event_name, payload)?).await,
            other => Err(PluginError::UnknownEvent(other.to_string())),
        }
    }

    async fn ensure_loaded(&self) -> Result<(), PluginError> {
        if self.service.cache().read().await.is_loaded() {
            Ok(())
        } else {
            Err(PluginError::NotLoaded)
        }
    }
}

fn parse<T: DeserializeOwned>(event: &str, payload: serde_json::Value) -> Result<T, PluginError> {
    serde_json::from_value(payload).map_err(|e| PluginError::InvalidPayload {
        event: event.to_string(),
        reason: e.to_string(),
    })
}
