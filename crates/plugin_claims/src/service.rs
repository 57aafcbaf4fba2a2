//! # Region Service
//!
//! Every change to a claim goes through [`RegionService`], which keeps the
//! durable store and the shared [`RegionCache`] in step.
//!
//! ## Write Path
//!
//! 1. Take the cache write lock
//! 2. Check the request against the cache (ownership, name, overlap)
//! 3. Commit to the store
//! 4. Mirror the committed change into the cache
//!
//! The lock is held across all four steps. Event handlers, which only read,
//! never see a region that is in the store but not yet in the cache, and two
//! concurrent claims cannot both pass the overlap check. If the store write
//! fails the cache is left as it was.

use crate::error::ServiceError;
use crate::events::Location;
use claims_core::{
    geometry::compute_claim_bounds, Bounds, BoundsPatch, CacheStats, ClaimError, Flags,
    FlagsPatch, Member, NewRegion, Region, RegionCache, RegionId, RegionStore, StoreError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Cache handle shared by the service and the event handlers.
pub type SharedRegionCache = Arc<RwLock<RegionCache>>;

/// Limits applied to player-created claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimRules {
    /// Edge length used when a claim request gives none
    pub default_size: u32,
    pub max_size: u32,
    /// Maximum region name length in characters
    pub max_name_length: usize,
}

impl Default for ClaimRules {
    fn default() -> Self {
        Self {
            default_size: 21,
            max_size: 101,
            max_name_length: 32,
        }
    }
}

impl ClaimRules {
    pub fn check_size(&self, size: u32) -> Result<(), ServiceError> {
        if size == 0 || size % 2 == 0 {
            return Err(ClaimError::InvalidClaimSize(size).into());
        }
        if size > self.max_size {
            return Err(ServiceError::SizeTooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// Trims `name` and checks it is non-empty and short enough.
    pub fn check_name<'a>(&self, name: &'a str) -> Result<&'a str, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidName("name cannot be blank".to_string()));
        }
        if name.chars().count() > self.max_name_length {
            return Err(ServiceError::InvalidName(format!(
                "'{name}' is longer than {} characters",
                self.max_name_length
            )));
        }
        Ok(name)
    }
}

/// A player's request to claim the area around them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub owner: String,
    pub world: String,
    pub location: Location,
    pub name: String,
    /// Edge length of the claimed cube; the configured default when absent
    pub size: Option<u32>,
}

/// Applies claim changes to the store and mirrors them into the cache.
pub struct RegionService {
    store: Arc<dyn RegionStore>,
    cache: SharedRegionCache,
    rules: ClaimRules,
}

impl RegionService {
    pub fn new(store: Arc<dyn RegionStore>, rules: ClaimRules) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(RegionCache::new())),
            rules,
        }
    }

    pub fn cache(&self) -> SharedRegionCache {
        Arc::clone(&self.cache)
    }

    pub fn rules(&self) -> &ClaimRules {
        &self.rules
    }

    /// Fills the cache from the store. Subsequent calls are ignored.
    pub async fn load(&self) -> Result<usize, ServiceError> {
        let mut cache = self.cache.write().await;
        if cache.is_loaded() {
            warn!("🗺️ Region cache already loaded, skipping reload");
            return Ok(cache.len());
        }
        Ok(cache.load_all(self.store.as_ref()).await?)
    }

    /// Claims a cube around the requester's location.
    pub async fn create_claim(&self, request: ClaimRequest) -> Result<Region, ServiceError> {
        let name = self.rules.check_name(&request.name)?.to_string();
        let size = request.size.unwrap_or(self.rules.default_size);
        self.rules.check_size(size)?;

        let location = request.location;
        let bounds = compute_claim_bounds(location.x, location.y, location.z, size)?;

        let mut cache = self.cache.write().await;
        if cache.get_by_name(&name).is_some() {
            return Err(ServiceError::NameTaken(name));
        }
        if let Some(existing) = cache.find_intersecting_box(&request.world, bounds.min(), bounds.max()) {
            return Err(ServiceError::Overlap {
                existing: existing.name.clone(),
            });
        }

        let region = self
            .store
            .create(NewRegion {
                name,
                owner: request.owner,
                world: request.world,
                bounds: Some(bounds),
                flags: Flags::default(),
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateName(name) => ServiceError::NameTaken(name),
                other => ServiceError::Store(other),
            })?;

        cache.add(region.clone());
        info!(
            "🏠 {} claimed '{}' in {} from {} to {}",
            region.owner,
            region.name,
            region.world,
            bounds.min(),
            bounds.max()
        );
        Ok(region)
    }

    /// Deletes a region owned by `actor`, returning its last snapshot.
    pub async fn delete_region(&self, actor: &str, name: &str) -> Result<Region, ServiceError> {
        let mut cache = self.cache.write().await;
        let id = owned_region(&cache, actor, name)?;

        if !self.store.delete(id).await? {
            warn!("🏠 Region '{}' ({}) was cached but missing from the store", name, id);
        }
        let region = cache
            .remove(id)
            .ok_or_else(|| ServiceError::RegionNotFound(name.to_string()))?;

        info!("🏠 {} deleted region '{}'", actor, region.name);
        Ok(region)
    }

    /// Applies a partial flag update. Returns false if the region has no flags.
    pub async fn update_flags(
        &self,
        actor: &str,
        name: &str,
        patch: &FlagsPatch,
    ) -> Result<bool, ServiceError> {
        let mut cache = self.cache.write().await;
        let id = owned_region(&cache, actor, name)?;

        if !self.store.update_flags(id, patch).await? {
            return Ok(false);
        }
        cache.update_flags(id, patch);
        info!("🏠 {} updated flags of '{}'", actor, name);
        Ok(true)
    }

    /// Moves the faces of a region. The result must be well-formed and must not
    /// overlap any other region in the same world.
    pub async fn update_bounds(
        &self,
        actor: &str,
        name: &str,
        patch: &BoundsPatch,
    ) -> Result<Bounds, ServiceError> {
        let mut cache = self.cache.write().await;
        let id = owned_region(&cache, actor, name)?;
        let region = cache
            .get(id)
            .ok_or_else(|| ServiceError::RegionNotFound(name.to_string()))?;
        let Some(current) = region.bounds else {
            return Err(ServiceError::InvalidBounds(format!("'{name}' has no bounds")));
        };

        let updated = current.apply(patch);
        updated.validate().map_err(|e| match e {
            ClaimError::InvalidBounds(reason) => ServiceError::InvalidBounds(reason),
            other => ServiceError::Claim(other),
        })?;

        if let Some(other) = cache
            .intersecting_regions(&region.world, updated.min(), updated.max())
            .into_iter()
            .find(|other| other.id != id)
        {
            return Err(ServiceError::Overlap {
                existing: other.name.clone(),
            });
        }

        if !self.store.update_bounds(id, patch).await? {
            return Err(ServiceError::RegionNotFound(name.to_string()));
        }
        cache.update_bounds(id, patch);
        info!(
            "🏠 {} resized '{}' to {} .. {}",
            actor,
            name,
            updated.min(),
            updated.max()
        );
        Ok(updated)
    }

    /// Grants `player` member rights. Adding an existing member is a no-op.
    pub async fn add_member(
        &self,
        actor: &str,
        name: &str,
        player: &str,
    ) -> Result<Member, ServiceError> {
        let player = player.trim();
        if player.is_empty() {
            return Err(ServiceError::InvalidName("player name cannot be blank".to_string()));
        }

        let mut cache = self.cache.write().await;
        let id = owned_region(&cache, actor, name)?;
        if cache.is_owner(id, player) {
            return Err(ServiceError::OwnerIsNotMember(name.to_string()));
        }

        let member = self.store.add_member(id, player).await?;
        if cache.add_member(id, member.clone()) {
            info!("🏠 {} added {} to '{}'", actor, player, name);
        }
        Ok(member)
    }

    /// Revokes member rights. Returns false if `player` was not a member.
    pub async fn remove_member(
        &self,
        actor: &str,
        name: &str,
        player: &str,
    ) -> Result<bool, ServiceError> {
        let player = player.trim();
        let mut cache = self.cache.write().await;
        let id = owned_region(&cache, actor, name)?;

        if !self.store.remove_member(id, player).await? {
            return Ok(false);
        }
        cache.remove_member(id, player);
        info!("🏠 {} removed {} from '{}'", actor, player, name);
        Ok(true)
    }

    /// Regions owned by `owner`, ordered by id.
    pub async fn regions_owned_by(&self, owner: &str) -> Vec<Region> {
        let cache = self.cache.read().await;
        cache.get_by_owner(owner).into_iter().cloned().collect()
    }

    pub async fn region_info(&self, name: &str) -> Option<Region> {
        self.cache.read().await.get_by_name(name).cloned()
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }
}

/// Resolves `name` to a region id, checking that `actor` owns it.
fn owned_region(cache: &RegionCache, actor: &str, name: &str) -> Result<RegionId, ServiceError> {
    let region = cache
        .get_by_name(name)
        .ok_or_else(|| ServiceError::RegionNotFound(name.to_string()))?;
    if !region.is_owned_by(actor) {
        return Err(ServiceError::NotOwner {
            region: name.to_string(),
            actor: actor.to_string(),
        });
    }
    Ok(region.id)
}
