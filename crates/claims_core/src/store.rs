//! Interface of the durable region store.
//!
//! The store is the source of truth. The [`RegionCache`](crate::cache::RegionCache)
//! is filled from it once at startup and then mirrors every successful write.

use crate::error::StoreError;
use crate::types::{BoundsPatch, FlagsPatch, Member, NewRegion, Region, RegionId};
use async_trait::async_trait;

/// Durable CRUD over regions, their bounds, flags and members.
///
/// Every returned [`Region`] is an owned copy with bounds, flags and members
/// attached; later store activity never mutates it.
#[async_trait]
pub trait RegionStore: Send + Sync {
    /// All regions with their bounds, flags and members.
    async fn get_all(&self) -> Result<Vec<Region>, StoreError>;

    async fn get_by_id(&self, id: RegionId) -> Result<Option<Region>, StoreError>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Region>, StoreError>;

    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Region>, StoreError>;

    /// Persists a new region and returns it with its generated id.
    ///
    /// Fails with [`StoreError::DuplicateName`] if the name is taken.
    async fn create(&self, region: NewRegion) -> Result<Region, StoreError>;

    /// Deletes the region with its bounds, flags and members. False if absent.
    async fn delete(&self, id: RegionId) -> Result<bool, StoreError>;

    /// Applies the present fields only. False if the region or its flags are absent.
    async fn update_flags(&self, id: RegionId, patch: &FlagsPatch) -> Result<bool, StoreError>;

    /// Applies the present fields only. False if the region or its bounds are absent.
    async fn update_bounds(&self, id: RegionId, patch: &BoundsPatch) -> Result<bool, StoreError>;

    /// Adds a member, returning the existing row if already present.
    async fn add_member(&self, id: RegionId, player_name: &str) -> Result<Member, StoreError>;

    /// Removes a member. False if the pairing did not exist.
    async fn remove_member(&self, id: RegionId, player_name: &str) -> Result<bool, StoreError>;
}
