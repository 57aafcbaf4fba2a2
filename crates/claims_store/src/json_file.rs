//! Region store persisted to a single JSON document.
//!
//! The whole table is rewritten after every successful write: serialized to a
//! sibling temporary file, then renamed over the document. A failed persist
//! rolls the in-memory table back, so the store never reports a write that is
//! not on disk.

use crate::table::RegionTable;
use async_trait::async_trait;
use claims_core::{
    BoundsPatch, FlagsPatch, Member, NewRegion, Region, RegionId, RegionStore, StoreError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// On-disk layout.
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    next_id: u64,
    regions: Vec<Region>,
}

/// File-backed region store.
#[derive(Debug)]
pub struct JsonFileRegionStore {
    path: PathBuf,
    table: Mutex<RegionTable>,
}

impl JsonFileRegionStore {
    /// Opens the store at `path`, starting empty if the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let table = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let document: StoreDocument = serde_json::from_slice(&bytes).map_err(|e| {
                    StoreError::SerializationError(format!("{}: {e}", path.display()))
                })?;
                RegionTable::from_parts(document.next_id, document.regions)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("💾 No region store at {}, starting empty", path.display());
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                RegionTable::default()
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "💾 Opened region store {} ({} regions)",
            path.display(),
            table.len()
        );

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `op` against the table and persists the result if it changed
    /// anything. `op` returns its value and whether the table was modified.
    async fn write<T>(
        &self,
        op: impl FnOnce(&mut RegionTable) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let mut table = self.table.lock().await;
        let snapshot = table.clone();

        let (value, changed) = op(&mut table)?;
        if !changed {
            return Ok(value);
        }

        if let Err(e) = self.persist(&table).await {
            error!("💾 Failed to persist region store {}: {}", self.path.display(), e);
            *table = snapshot;
            return Err(e);
        }
        Ok(value)
    }

    async fn persist(&self, table: &RegionTable) -> Result<(), StoreError> {
        let document = StoreDocument {
            next_id: table.next_id(),
            regions: table.all(),
        };
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("💾 Persisted {} regions to {}", document.regions.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl RegionStore for JsonFileRegionStore {
    async fn get_all(&self) -> Result<Vec<Region>, StoreError> {
        Ok(self.table.lock().await.all())
    }

    async fn get_by_id(&self, id: RegionId) -> Result<Option<Region>, StoreError> {
        Ok(self.table.lock().await.by_id(id))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Region>, StoreError> {
        Ok(self.table.lock().await.by_name(name))
    }

    async fn get_by_owner(&self, owner: &str) -> Result<Vec<Region>, StoreError> {
        Ok(self.table.lock().await.by_owner(owner))
    }

    async fn create(&self, region: NewRegion) -> Result<Region, StoreError> {
        self.write(|table| table.create(region).map(|r| (r, true))).await
    }

    async fn delete(&self, id: RegionId) -> Result<bool, StoreError> {
        self.write(|table| {
            let deleted = table.delete(id);
            Ok((deleted, deleted))
        })
        .await
    }

    async fn update_flags(&self, id: RegionId, patch: &FlagsPatch) -> Result<bool, StoreError> {
        self.write(|table| {
            let updated = table.update_flags(id, patch);
            Ok((updated, updated))
        })
        .await
    }

    async fn update_bounds(&self, id: RegionId, patch: &BoundsPatch) -> Result<bool, StoreError> {
        self.write(|table| {
            let updated = table.update_bounds(id, patch);
            Ok((updated, updated))
        })
        .await
    }

    async fn add_member(&self, id: RegionId, player_name: &str) -> Result<Member, StoreError> {
        self.write(|table| {
            let before = table.by_id(id).map(|r| r.members.len());
            let member = table.add_member(id, player_name)?;
            let after = table.by_id(id).map(|r| r.members.len());
            Ok((member, before != after))
        })
        .await
    }

    async fn remove_member(&self, id: RegionId, player_name: &str) -> Result<bool, StoreError> {
        self.write(|table| {
            let removed = table.remove_member(id, player_name);
            Ok((removed, removed))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_core::{geometry::compute_claim_bounds, Flags};
    use tempfile::TempDir;

    fn new_region(name: &str) -> NewRegion {
        NewRegion {
            name: name.to_string(),
            owner: "alice".to_string(),
            world: "overworld".to_string(),
            bounds: Some(compute_claim_bounds(5.0, 65.0, 5.0, 11).unwrap()),
            flags: Flags::default(),
        }
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("regions.json");

        let store = JsonFileRegionStore::open(&path).await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(path.parent().unwrap().exists());
        // Nothing is written until the first change
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regions.json");

        let home_id = {
            let store = JsonFileRegionStore::open(&path).await.unwrap();
            let home = store.create(new_region("home")).await.unwrap();
            store.add_member(home.id, "bob").await.unwrap();
            let patch = FlagsPatch {
                explosions: Some(true),
                ..Default::default()
            };
            store.update_flags(home.id, &patch).await.unwrap();
            home.id
        };

        let reopened = JsonFileRegionStore::open(&path).await.unwrap();
        let home = reopened.get_by_id(home_id).await.unwrap().unwrap();
        assert_eq!(home.name, "home");
        assert!(home.has_member("bob"));
        assert!(home.flags.unwrap().explosions);

        let farm = reopened.create(new_region("farm")).await.unwrap();
        assert!(farm.id > home_id);
    }

    #[tokio::test]
    async fn test_no_temporary_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regions.json");

        let store = JsonFileRegionStore::open(&path).await.unwrap();
        store.create(new_region("home")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["regions.json".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regions.json");
        let store = JsonFileRegionStore::open(&path).await.unwrap();

        // Removing the directory makes the temporary file unwritable
        drop(dir);

        let result = store.create(new_region("home")).await;
        assert!(matches!(result, Err(StoreError::IoError(_))));
        assert!(store.get_by_name("home").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_does_not_touch_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regions.json");
        let store = JsonFileRegionStore::open(&path).await.unwrap();

        store.create(new_region("home")).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = store.create(new_region("home")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regions.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = JsonFileRegionStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::SerializationError(_)));
    }
}
