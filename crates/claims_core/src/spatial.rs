//! R*-tree backed spatial index over claim footprints.
//!
//! Only the two horizontal axes (X, Z) are indexed. Claims are column-shaped, so a
//! 2D envelope narrows candidates nearly as well as a 3D one; the vertical axis and
//! exact containment are checked by the caller. If claims stop being tall columns
//! this tradeoff has to be revisited.

use crate::types::{Bounds, RegionId};
use rstar::{RTree, RTreeObject, AABB};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Entry stored inside the R-tree.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    id: RegionId,
    min: [i64; 2],
    max: [i64; 2],
}

impl IndexEntry {
    fn new(id: RegionId, bounds: &Bounds) -> Self {
        Self {
            id,
            min: [i64::from(bounds.min_x), i64::from(bounds.min_z)],
            max: [i64::from(bounds.max_x), i64::from(bounds.max_z)],
        }
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Counters describing index activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpatialIndexStats {
    pub entries: usize,
    pub total_insertions: u64,
    pub total_removals: u64,
    pub total_queries: u64,
}

/// Maps region footprints to region ids.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
    /// Current entry per id, so removal does not need the caller's box
    entries: HashMap<RegionId, IndexEntry>,
    insertions: u64,
    removals: u64,
    /// Queries run under a shared borrow
    queries: AtomicU64,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the footprint of `bounds` for `id`, replacing any previous entry.
    pub fn insert(&mut self, id: RegionId, bounds: &Bounds) {
        self.remove(id);

        let entry = IndexEntry::new(id, bounds);
        self.tree.insert(entry.clone());
        self.entries.insert(id, entry);
        self.insertions += 1;
    }

    /// Removes the entry for `id`. Returns false if none existed.
    pub fn remove(&mut self, id: RegionId) -> bool {
        let Some(existing) = self.entries.remove(&id) else {
            return false;
        };
        let removed = self.tree.remove(&existing).is_some();
        if removed {
            self.removals += 1;
        }
        removed
    }

    /// Ids whose footprint intersects the horizontal box `[min, max]` (inclusive).
    ///
    /// A point query uses `min == max`. Results are unordered candidates.
    pub fn intersecting(&self, min: [i32; 2], max: [i32; 2]) -> Vec<RegionId> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let envelope = AABB::from_corners(
            [i64::from(min[0]), i64::from(min[1])],
            [i64::from(max[0]), i64::from(max[1])],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> SpatialIndexStats {
        SpatialIndexStats {
            entries: self.entries.len(),
            total_insertions: self.insertions,
            total_removals: self.removals,
            total_queries: self.queries.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockPos;

    fn bounds(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Bounds {
        Bounds::new(
            BlockPos::new(min_x, 0, min_z),
            BlockPos::new(max_x, 255, max_z),
            BlockPos::new((min_x + max_x) / 2, 64, (min_z + max_z) / 2),
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_point_query() {
        let mut index = SpatialIndex::new();
        index.insert(RegionId(1), &bounds(0, 0, 10, 10));
        index.insert(RegionId(2), &bounds(100, 100, 120, 120));

        assert_eq!(index.intersecting([5, 5], [5, 5]), vec![RegionId(1)]);
        assert_eq!(index.intersecting([110, 100], [110, 100]), vec![RegionId(2)]);
        assert!(index.intersecting([50, 50], [50, 50]).is_empty());
    }

    #[test]
    fn test_edges_are_inclusive() {
        let mut index = SpatialIndex::new();
        index.insert(RegionId(7), &bounds(-5, -5, 5, 5));

        assert_eq!(index.intersecting([-5, 5], [-5, 5]), vec![RegionId(7)]);
        assert!(index.intersecting([6, 0], [6, 0]).is_empty());
    }

    #[test]
    fn test_box_query_returns_all_candidates() {
        let mut index = SpatialIndex::new();
        index.insert(RegionId(1), &bounds(0, 0, 10, 10));
        index.insert(RegionId(2), &bounds(20, 0, 30, 10));
        index.insert(RegionId(3), &bounds(60, 60, 70, 70));

        let mut ids = index.intersecting([5, 5], [25, 5]);
        ids.sort();
        assert_eq!(ids, vec![RegionId(1), RegionId(2)]);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut index = SpatialIndex::new();
        index.insert(RegionId(1), &bounds(0, 0, 10, 10));
        index.insert(RegionId(1), &bounds(50, 50, 60, 60));

        assert_eq!(index.len(), 1);
        assert!(index.intersecting([5, 5], [5, 5]).is_empty());
        assert_eq!(index.intersecting([55, 55], [55, 55]), vec![RegionId(1)]);
    }

    #[test]
    fn test_remove() {
        let mut index = SpatialIndex::new();
        index.insert(RegionId(1), &bounds(0, 0, 10, 10));

        assert!(index.remove(RegionId(1)));
        assert!(!index.remove(RegionId(1)));
        assert!(index.is_empty());
        assert!(index.intersecting([5, 5], [5, 5]).is_empty());

        let stats = index.stats();
        assert_eq!(stats.total_insertions, 1);
        assert_eq!(stats.total_removals, 1);
        assert_eq!(stats.entries, 0);
    }
}
