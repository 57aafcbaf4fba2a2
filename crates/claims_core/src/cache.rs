//! # Region Cache
//!
//! Write-through, in-memory mirror of the region store, answering "which claim
//! covers this block?" on the event path without touching storage.
//!
//! ## State
//!
//! - **Region table**: `RegionId -> Region` snapshots
//! - **Spatial index**: horizontal footprint of every bounded region
//! - **Membership index**: `RegionId -> player names`, always equal to each
//!   snapshot's member list
//!
//! ## Consistency
//!
//! The cache never writes to the store. Callers commit to the store first and then
//! call the matching mirror method (`add`, `remove`, `update_flags`, ...). Mirror
//! calls for ids the cache does not know are ignored: the store stays authoritative
//! and the cache is rebuilt from it on every start.
//!
//! ## Thread Safety
//!
//! No internal locking. Share it behind one lock (see `SharedRegionCache` in the
//! plugin crate) so every mirror step is observed whole.

use crate::error::StoreError;
use crate::spatial::{SpatialIndex, SpatialIndexStats};
use crate::store::RegionStore;
use crate::types::{BlockPos, BoundsPatch, FlagsPatch, Member, Region, RegionId};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};


/// Snapshot of cache sizes for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub regions: usize,
    pub bounded_regions: usize,
    pub memberships: usize,
    pub index: SpatialIndexStats,
}

/// In-memory region table with spatial and membership indexes.
#[derive(Debug, Default)]
pub struct RegionCache {
    regions: HashMap<RegionId, Region>,
    spatial_index: SpatialIndex,
    membership: HashMap<RegionId, HashSet<String>>,
    loaded: bool,
}

impl RegionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pulls every region from the store into the cache.
    ///
    /// Called once at startup, before the cache is shared with event handlers.
    /// Existing entries are not cleared. Returns the number of regions loaded.
    pub async fn load_all(&mut self, store: &dyn RegionStore) -> Result<usize, StoreError> {
        info!("🗺️ Loading regions into cache...");

        let regions = store.get_all().await?;
        let count = regions.len();
        for region in regions {
            self.insert_snapshot(region);
        }

        self.loaded = true;
        info!(
            "🗺️ Loaded {} regions ({} indexed)",
            count,
            self.spatial_index.len()
        );
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Region> {
        self.regions.values().find(|region| region.name == name)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Finds the region covering column `(x, z)` in `world`, additionally
    /// requiring `y` to be inside the vertical extent when given.
    ///
    /// If several regions match, the one with the lowest id wins.
    pub fn find_at_point(&self, world: &str, x: i32, z: i32, y: Option<i32>) -> Option<&Region> {
        self.spatial_index
            .intersecting([x, z], [x, z])
            .into_iter()
            .filter_map(|id| self.regions.get(&id))
            .filter(|region| region.world == world)
            .filter(|region| {
                region.bounds.is_some_and(|bounds| {
                    bounds.contains_column(x, z)
                        && y.map_or(true, |y| bounds.min_y <= y && y <= bounds.max_y)
                })
            })
            .min_by_key(|region| region.id)
    }

    /// Shorthand for a full 3D block lookup.
    pub fn region_at(&self, world: &str, pos: BlockPos) -> Option<&Region> {
        self.find_at_point(world, pos.x, pos.z, Some(pos.y))
    }

    /// Finds a region in `world` whose bounds overlap the box `[min, max]` on all
    /// three axes. Used to reject a claim that would overlap an existing one.
    pub fn find_intersecting_box(
        &self,
        world: &str,
        min: BlockPos,
        max: BlockPos,
    ) -> Option<&Region> {
        self.intersecting_regions(world, min, max).into_iter().next()
    }

    /// Every region in `world` overlapping `[min, max]`, ordered by id.
    pub fn intersecting_regions(&self, world: &str, min: BlockPos, max: BlockPos) -> Vec<&Region> {
        let mut matches: Vec<&Region> = self
            .spatial_index
            .intersecting([min.x, min.z], [max.x, max.z])
            .into_iter()
            .filter_map(|id| self.regions.get(&id))
            .filter(|region| region.world == world)
            .filter(|region| region.bounds.is_some_and(|bounds| bounds.intersects(min, max)))
            .collect();
        matches.sort_by_key(|region| region.id);
        matches
    }

    /// Mirrors a region the store has just created.
    ///
    /// `region` must carry its store-assigned id.
    pub fn add(&mut self, region: Region) {
        if self.regions.contains_key(&region.id) {
            warn!(
                "🗺️ Region {} already cached; replacing snapshot for '{}'",
                region.id, region.name
            );
            self.remove(region.id);
        }
        debug!("🗺️ Caching region '{}' ({})", region.name, region.id);
        self.insert_snapshot(region);
    }

    /// Drops a region with its index entry and memberships.
    ///
    /// Returns the removed snapshot; `None` if it was not cached.
    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let region = self.regions.remove(&id)?;
        if region.bounds.is_some() {
            self.spatial_index.remove(id);
        }
        self.membership.remove(&id);
        debug!("🗺️ Evicted region '{}' ({})", region.name, id);
        Some(region)
    }

    /// Mirrors a partial flag update. No-op if the region or its flags are absent.
    pub fn update_flags(&mut self, id: RegionId, patch: &FlagsPatch) -> bool {
        let Some(region) = self.regions.get_mut(&id) else {
            debug!("🗺️ Flag update for uncached region {}", id);
            return false;
        };
        let Some(flags) = region.flags.as_mut() else {
            return false;
        };
        flags.apply(patch);
        region.updated_at = Utc::now();
        true
    }

    /// Mirrors a partial bounds update, re-indexing the footprint in the same step.
    /// No-op if the region or its bounds are absent.
    pub fn update_bounds(&mut self, id: RegionId, patch: &BoundsPatch) -> bool {
        let Some(region) = self.regions.get_mut(&id) else {
            debug!("🗺️ Bounds update for uncached region {}", id);
            return false;
        };
        let Some(bounds) = region.bounds else {
            return false;
        };
        let updated = bounds.apply(patch);
        region.bounds = Some(updated);
        region.updated_at = Utc::now();
        self.spatial_index.insert(id, &updated);
        true
    }

    /// Mirrors a member addition into both the membership index and the snapshot.
    ///
    /// Returns false if the region is unknown or the player is already a member.
    pub fn add_member(&mut self, id: RegionId, member: Member) -> bool {
        let Some(region) = self.regions.get_mut(&id) else {
            debug!("🗺️ Member add for uncached region {}", id);
            return false;
        };
        let members = self.membership.entry(id).or_default();
        if !members.insert(member.player_name.clone()) {
            return false;
        }
        region.members.push(member);
        true
    }

    /// Mirrors a member removal. No-op if the pairing is absent.
    pub fn remove_member(&mut self, id: RegionId, player_name: &str) -> bool {
        let Some(region) = self.regions.get_mut(&id) else {
            return false;
        };
        let removed = self
            .membership
            .get_mut(&id)
            .is_some_and(|members| members.remove(player_name));
        if removed {
            region.members.retain(|m| m.player_name != player_name);
        }
        removed
    }

    pub fn is_member(&self, id: RegionId, player_name: &str) -> bool {
        self.membership
            .get(&id)
            .is_some_and(|members| members.contains(player_name))
    }

    pub fn is_owner(&self, id: RegionId, player_name: &str) -> bool {
        self.regions
            .get(&id)
            .is_some_and(|region| region.owner == player_name)
    }

    /// Regions owned by `owner`, ordered by id.
    pub fn get_by_owner(&self, owner: &str) -> Vec<&Region> {
        let mut owned: Vec<&Region> = self
            .regions
            .values()
            .filter(|region| region.owner == owner)
            .collect();
        owned.sort_by_key(|region| region.id);
        owned
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            regions: self.regions.len(),
            bounded_regions: self.spatial_index.len(),
            memberships: self.membership.values().map(HashSet::len).sum(),
            index: self.spatial_index.stats(),
        }
    }

    fn insert_snapshot(&mut self, region: Region) {
        let id = region.id;
        if let Some(bounds) = region.bounds.as_ref() {
            self.spatial_index.insert(id, bounds);
        }
        let members = self.membership.entry(id).or_default();
        for member in &region.members {
            members.insert(member.player_name.clone());
        }
        self.regions.insert(id, region);
    }
}
