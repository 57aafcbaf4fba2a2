//! The region table shared by every store backend.
//!
//! Plain synchronous data with no I/O. Backends wrap it in their own lock and
//! decide when (and whether) to persist it.

use chrono::Utc;
use claims_core::{
    BoundsPatch, FlagsPatch, Member, NewRegion, Region, RegionId, StoreError,
};
use std::collections::BTreeMap;

/// Every stored region keyed by id, plus the id sequence.
#[derive(Debug, Clone)]
pub struct RegionTable {
    next_id: u64,
    regions: BTreeMap<RegionId, Region>,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            regions: BTreeMap::new(),
        }
    }
}

impl RegionTable {
    /// Rebuilds a table from persisted parts.
    ///
    /// `next_id` is raised past the highest stored id so ids are never reused.
    pub fn from_parts(next_id: u64, regions: Vec<Region>) -> Self {
        let highest = regions.iter().map(|r| r.id.0).max().unwrap_or(0);
        Self {
            next_id: next_id.max(highest + 1),
            regions: regions.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn all(&self) -> Vec<Region> {
        self.regions.values().cloned().collect()
    }

    pub fn by_id(&self, id: RegionId) -> Option<Region> {
        self.regions.get(&id).cloned()
    }

    pub fn by_name(&self, name: &str) -> Option<Region> {
        self.regions.values().find(|r| r.name == name).cloned()
    }

    pub fn by_owner(&self, owner: &str) -> Vec<Region> {
        self.regions
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect()
    }

    pub fn create(&mut self, new: NewRegion) -> Result<Region, StoreError> {
        if self.regions.values().any(|r| r.name == new.name) {
            return Err(StoreError::DuplicateName(new.name));
        }

        let id = RegionId(self.next_id);
        self.next_id += 1;

        let now = Utc::now();
        let region = Region {
            id,
            name: new.name,
            owner: new.owner,
            world: new.world,
            bounds: new.bounds,
            flags: Some(new.flags),
            members: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.regions.insert(id, region.clone());
        Ok(region)
    }

    pub fn delete(&mut self, id: RegionId) -> bool {
        self.regions.remove(&id).is_some()
    }

    pub fn update_flags(&mut self, id: RegionId, patch: &FlagsPatch) -> bool {
        let Some(region) = self.regions.get_mut(&id) else {
            return false;
        };
        let Some(flags) = region.flags.as_mut() else {
            return false;
        };
        flags.apply(patch);
        region.updated_at = Utc::now();
        true
    }

    pub fn update_bounds(&mut self, id: RegionId, patch: &BoundsPatch) -> bool {
        let Some(region) = self.regions.get_mut(&id) else {
            return false;
        };
        let Some(bounds) = region.bounds else {
            return false;
        };
        region.bounds = Some(bounds.apply(patch));
        region.updated_at = Utc::now();
        true
    }

    /// Adds a member; an existing pairing is returned unchanged.
    pub fn add_member(&mut self, id: RegionId, player_name: &str) -> Result<Member, StoreError> {
        let region = self
            .regions
            .get_mut(&id)
            .ok_or(StoreError::RegionNotFound(id))?;

        if let Some(existing) = region.members.iter().find(|m| m.player_name == player_name) {
            return Ok(existing.clone());
        }

        let member = Member {
            player_name: player_name.to_string(),
            added_at: Utc::now(),
        };
        region.members.push(member.clone());
        Ok(member)
    }

    pub fn remove_member(&mut self, id: RegionId, player_name: &str) -> bool {
        let Some(region) = self.regions.get_mut(&id) else {
            return false;
        };
        let before = region.members.len();
        region.members.retain(|m| m.player_name != player_name);
        region.members.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_core::{geometry::compute_claim_bounds, Flags};

    fn new_region(name: &str, owner: &str) -> NewRegion {
        NewRegion {
            name: name.to_string(),
            owner: owner.to_string(),
            world: "overworld".to_string(),
            bounds: Some(compute_claim_bounds(0.0, 64.0, 0.0, 11).unwrap()),
            flags: Flags::default(),
        }
    }

    #[test]
    fn test_ids_are_sequential_and_never_reused() {
        let mut table = RegionTable::default();
        let a = table.create(new_region("a", "alice")).unwrap();
        let b = table.create(new_region("b", "alice")).unwrap();
        assert_eq!((a.id, b.id), (RegionId(1), RegionId(2)));

        assert!(table.delete(b.id));
        let c = table.create(new_region("c", "alice")).unwrap();
        assert_eq!(c.id, RegionId(3));
    }

    #[test]
    fn test_from_parts_repairs_sequence() {
        let mut table = RegionTable::default();
        let home = table.create(new_region("home", "alice")).unwrap();

        let rebuilt = RegionTable::from_parts(1, vec![home]);
        assert_eq!(rebuilt.next_id(), 2);
        assert_eq!(rebuilt.len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut table = RegionTable::default();
        table.create(new_region("home", "alice")).unwrap();
        let err = table.create(new_region("home", "bob")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(name) if name == "home"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_add_member_is_idempotent() {
        let mut table = RegionTable::default();
        let home = table.create(new_region("home", "alice")).unwrap();

        let first = table.add_member(home.id, "bob").unwrap();
        let second = table.add_member(home.id, "bob").unwrap();
        assert_eq!(first, second);
        assert_eq!(table.by_id(home.id).unwrap().members.len(), 1);

        assert!(matches!(
            table.add_member(RegionId(99), "bob"),
            Err(StoreError::RegionNotFound(RegionId(99)))
        ));
    }

    #[test]
    fn test_returned_regions_are_detached() {
        let mut table = RegionTable::default();
        let home = table.create(new_region("home", "alice")).unwrap();
        let snapshot = table.by_id(home.id).unwrap();

        table.add_member(home.id, "bob").unwrap();
        assert!(snapshot.members.is_empty());
    }
}
