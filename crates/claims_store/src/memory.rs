//! Volatile store for tests and dry runs.

use crate::table::RegionTable;
use async_trait::async_trait;
use claims_core::{
    BoundsPatch, FlagsPatch, Member, NewRegion, Region, RegionId, RegionStore, StoreError,
};
use std::sync::{Mutex, MutexGuard};

/// Region store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryRegionStore {
    table: Mutex<RegionTable>,
}

impl MemoryRegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, RegionTable> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RegionStore for MemoryRegionStore {
    async fn get_all(&self) -> Result<Vec<Region>, StoreError> {
        Ok(self.table().all())
    }

    async fn get_by_id(&self, id: RegionId) -> Result<Option<Region>, StoreError> {
        Ok(self.table().by_id(id))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Region>, StoreError> {
        Ok(self.table().by_name(name))
    }

    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Region>, StoreError> {
        Ok(self.table().by_owner(owner))
    }

    async fn create(&self, region: NewRegion) -> Result<Region, StoreError> {
        self.table().create(region)
    }

    async fn delete(&self, id: RegionId) -> Result<bool, StoreError> {
        Ok(self.table().delete(id))
    }

    async fn update_flags(&self, id: RegionId, patch: &FlagsPatch) -> Result<bool, StoreError> {
        Ok(self.table().update_flags(id, patch))
    }

    async fn update_bounds(&self, id: RegionId, patch: &BoundsPatch) -> Result<bool, StoreError> {
        Ok(self.table().update_bounds(id, patch))
    }

    async fn add_member(&self, id: RegionId, player_name: &str) -> Result<Member, StoreError> {
        self.table().add_member(id, player_name)
    }

    async fn remove_member(&self, id: RegionId, player_name: &str) -> Result<bool, StoreError> {
        Ok(self.table().remove_member(id, player_name))
    }
}
