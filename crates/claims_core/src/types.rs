//! # Core Type Definitions
//!
//! Data model shared by the cache, the store implementations and the plugin.
//!
//! ## Key Types
//!
//! - [`RegionId`] - Store-assigned identifier of a claim
//! - [`BlockPos`] - Integer block coordinate
//! - [`Bounds`] - Inclusive axis-aligned box plus its anchor (center) block
//! - [`Flags`] / [`FlagsPatch`] - Permission and world-effect toggles
//! - [`Region`] - A full claim snapshot

use crate::error::ClaimError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a claimed region.
///
/// Assigned by the region store on creation and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A block coordinate in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Converts an entity location to the block that contains it.
    ///
    /// Coordinates outside the `i32` range saturate and NaN maps to 0; use
    /// [`BlockPos::try_from_location`] for untrusted input.
    pub fn from_location(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
            z: z.floor() as i32,
        }
    }

    /// Like [`BlockPos::from_location`], but rejects non-finite coordinates and
    /// blocks that do not fit in an `i32`.
    pub fn try_from_location(x: f64, y: f64, z: f64) -> Result<Self, ClaimError> {
        let block = |axis: char, value: f64| -> Result<i32, ClaimError> {
            let floored = value.floor();
            if !floored.is_finite() || floored < f64::from(i32::MIN) || floored > f64::from(i32::MAX) {
                return Err(ClaimError::InvalidLocation(format!("{axis} = {value}")));
            }
            Ok(floored as i32)
        };
        Ok(Self {
            x: block('x', x)?,
            y: block('y', y)?,
            z: block('z', z)?,
        })
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Inclusive bounds of a claim.
///
/// `center` is the anchor block: when the owner breaks it, the claim is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub max_z: i32,
    pub center: BlockPos,
}

impl Bounds {
    /// Builds bounds from two corners, rejecting inverted axes.
    pub fn new(min: BlockPos, max: BlockPos, center: BlockPos) -> Result<Self, ClaimError> {
        let bounds = Self {
            min_x: min.x,
            min_y: min.y,
            min_z: min.z,
            max_x: max.x,
            max_y: max.y,
            max_z: max.z,
            center,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Checks `min <= max` on every axis and that the anchor lies inside.
    pub fn validate(&self) -> Result<(), ClaimError> {
        for (axis, min, max) in [
            ('x', self.min_x, self.max_x),
            ('y', self.min_y, self.max_y),
            ('z', self.min_z, self.max_z),
        ] {
            if min > max {
                return Err(ClaimError::InvalidBounds(format!(
                    "min {axis} ({min}) is greater than max {axis} ({max})"
                )));
            }
        }
        if !self.contains(self.center) {
            return Err(ClaimError::InvalidBounds(format!(
                "anchor {} lies outside {} .. {}",
                self.center,
                self.min(),
                self.max()
            )));
        }
        Ok(())
    }

    pub fn min(&self) -> BlockPos {
        BlockPos::new(self.min_x, self.min_y, self.min_z)
    }

    pub fn max(&self) -> BlockPos {
        BlockPos::new(self.max_x, self.max_y, self.max_z)
    }

    /// True if the (x, z) column lies inside the horizontal extent.
    pub fn contains_column(&self, x: i32, z: i32) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_z <= z && z <= self.max_z
    }

    /// True if the block lies inside the bounds (inclusive on every axis).
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.contains_column(pos.x, pos.z) && self.min_y <= pos.y && pos.y <= self.max_y
    }

    /// Overlap test against another box, one interval check per axis.
    pub fn intersects(&self, min: BlockPos, max: BlockPos) -> bool {
        crate::geometry::intervals_overlap(self.min_x, self.max_x, min.x, max.x)
            && crate::geometry::intervals_overlap(self.min_y, self.max_y, min.y, max.y)
            && crate::geometry::intervals_overlap(self.min_z, self.max_z, min.z, max.z)
    }

    /// Returns a copy with the patched fields replaced. The center is kept.
    pub fn apply(&self, patch: &BoundsPatch) -> Bounds {
        Bounds {
            min_x: patch.min_x.unwrap_or(self.min_x),
            min_y: patch.min_y.unwrap_or(self.min_y),
            min_z: patch.min_z.unwrap_or(self.min_z),
            max_x: patch.max_x.unwrap_or(self.max_x),
            max_y: patch.max_y.unwrap_or(self.max_y),
            max_z: patch.max_z.unwrap_or(self.max_z),
            center: self.center,
        }
    }
}

/// Partial update of a region's bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundsPatch {
    pub min_x: Option<i32>,
    pub min_y: Option<i32>,
    pub min_z: Option<i32>,
    pub max_x: Option<i32>,
    pub max_y: Option<i32>,
    pub max_z: Option<i32>,
}

impl BoundsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-region permission and world-effect toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub can_break: bool,
    pub can_place: bool,
    pub can_open_chests: bool,
    pub pvp_enabled: bool,
    pub mob_spawning: bool,
    pub fire_spread: bool,
    pub explosions: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            can_break: false,
            can_place: false,
            can_open_chests: false,
            pvp_enabled: true,
            mob_spawning: true,
            fire_spread: false,
            explosions: false,
        }
    }
}

impl Flags {
    pub fn get(&self, kind: FlagKind) -> bool {
        match kind {
            FlagKind::CanBreak => self.can_break,
            FlagKind::CanPlace => self.can_place,
            FlagKind::CanOpenChests => self.can_open_chests,
            FlagKind::PvpEnabled => self.pvp_enabled,
            FlagKind::MobSpawning => self.mob_spawning,
            FlagKind::FireSpread => self.fire_spread,
            FlagKind::Explosions => self.explosions,
        }
    }

    /// Applies only the fields present in the patch.
    pub fn apply(&mut self, patch: &FlagsPatch) {
        if let Some(value) = patch.can_break {
            self.can_break = value;
        }
        if let Some(value) = patch.can_place {
            self.can_place = value;
        }
        if let Some(value) = patch.can_open_chests {
            self.can_open_chests = value;
        }
        if let Some(value) = patch.pvp_enabled {
            self.pvp_enabled = value;
        }
        if let Some(value) = patch.mob_spawning {
            self.mob_spawning = value;
        }
        if let Some(value) = patch.fire_spread {
            self.fire_spread = value;
        }
        if let Some(value) = patch.explosions {
            self.explosions = value;
        }
    }
}

/// Names of the updatable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    CanBreak,
    CanPlace,
    CanOpenChests,
    PvpEnabled,
    MobSpawning,
    FireSpread,
    Explosions,
}

impl FlagKind {
    pub const ALL: [FlagKind; 7] = [
        FlagKind::CanBreak,
        FlagKind::CanPlace,
        FlagKind::CanOpenChests,
        FlagKind::PvpEnabled,
        FlagKind::MobSpawning,
        FlagKind::FireSpread,
        FlagKind::Explosions,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            FlagKind::CanBreak => "can_break",
            FlagKind::CanPlace => "can_place",
            FlagKind::CanOpenChests => "can_open_chests",
            FlagKind::PvpEnabled => "pvp_enabled",
            FlagKind::MobSpawning => "mob_spawning",
            FlagKind::FireSpread => "fire_spread",
            FlagKind::Explosions => "explosions",
        }
    }
}

impl FromStr for FlagKind {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlagKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ClaimError::UnknownFlag(s.to_string()))
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial update of a region's flags. Absent fields stay untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagsPatch {
    pub can_break: Option<bool>,
    pub can_place: Option<bool>,
    pub can_open_chests: Option<bool>,
    pub pvp_enabled: Option<bool>,
    pub mob_spawning: Option<bool>,
    pub fire_spread: Option<bool>,
    pub explosions: Option<bool>,
}

impl FlagsPatch {
    /// Sets a field by its external name. Unknown names are rejected.
    pub fn set(&mut self, name: &str, value: bool) -> Result<(), ClaimError> {
        self.set_kind(name.parse()?, value);
        Ok(())
    }

    pub fn set_kind(&mut self, kind: FlagKind, value: bool) {
        let slot = match kind {
            FlagKind::CanBreak => &mut self.can_break,
            FlagKind::CanPlace => &mut self.can_place,
            FlagKind::CanOpenChests => &mut self.can_open_chests,
            FlagKind::PvpEnabled => &mut self.pvp_enabled,
            FlagKind::MobSpawning => &mut self.mob_spawning,
            FlagKind::FireSpread => &mut self.fire_spread,
            FlagKind::Explosions => &mut self.explosions,
        };
        *slot = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A player granted elevated permissions inside a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub player_name: String,
    pub added_at: DateTime<Utc>,
}

/// Snapshot of a claimed region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub owner: String,
    pub world: String,
    pub bounds: Option<Bounds>,
    pub flags: Option<Flags>,
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Region {
    pub fn has_member(&self, player_name: &str) -> bool {
        self.members.iter().any(|m| m.player_name == player_name)
    }

    pub fn is_owned_by(&self, player_name: &str) -> bool {
        self.owner == player_name
    }

    /// True if `pos` is this region's anchor block.
    pub fn is_anchor(&self, pos: BlockPos) -> bool {
        self.bounds.is_some_and(|b| b.center == pos)
    }
}

/// Payload for creating a region in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRegion {
    pub name: String,
    pub owner: String,
    pub world: String,
    pub bounds: Option<Bounds>,
    pub flags: Flags,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bounds() -> Bounds {
        Bounds::new(
            BlockPos::new(0, 60, 0),
            BlockPos::new(10, 70, 10),
            BlockPos::new(5, 65, 5),
        )
        .expect("valid bounds")
    }

    #[test]
    fn test_default_flags() {
        let flags = Flags::default();
        assert!(!flags.can_break);
        assert!(!flags.can_place);
        assert!(!flags.can_open_chests);
        assert!(flags.pvp_enabled);
        assert!(flags.mob_spawning);
        assert!(!flags.fire_spread);
        assert!(!flags.explosions);
    }

    #[test]
    fn test_bounds_rejects_inverted_axis() {
        let result = Bounds::new(
            BlockPos::new(0, 70, 0),
            BlockPos::new(10, 60, 10),
            BlockPos::default(),
        );
        assert!(matches!(result, Err(ClaimError::InvalidBounds(_))));
    }

    #[test]
    fn test_bounds_contains_is_inclusive() {
        let bounds = sample_bounds();
        assert!(bounds.contains(BlockPos::new(0, 60, 0)));
        assert!(bounds.contains(BlockPos::new(10, 70, 10)));
        assert!(!bounds.contains(BlockPos::new(11, 65, 5)));
        assert!(!bounds.contains(BlockPos::new(5, 71, 5)));
        assert!(bounds.contains_column(5, 10));
        assert!(!bounds.contains_column(5, -1));
    }

    #[test]
    fn test_bounds_rejects_anchor_outside() {
        let result = Bounds::new(
            BlockPos::new(20, 60, 0),
            BlockPos::new(30, 70, 10),
            BlockPos::new(5, 65, 5),
        );
        assert!(matches!(result, Err(ClaimError::InvalidBounds(_))));

        let moved = sample_bounds().apply(&BoundsPatch {
            min_x: Some(6),
            ..Default::default()
        });
        assert!(moved.validate().is_err());
    }

    #[test]
    fn test_bounds_patch_keeps_center() {
        let bounds = sample_bounds();
        let patch = BoundsPatch {
            max_y: Some(100),
            ..Default::default()
        };
        let patched = bounds.apply(&patch);
        assert_eq!(patched.max_y, 100);
        assert_eq!(patched.min_y, 60);
        assert_eq!(patched.center, bounds.center);
    }

    #[test]
    fn test_flags_patch_applies_only_present_fields() {
        let mut flags = Flags::default();
        let mut patch = FlagsPatch::default();
        patch.set("can_place", true).unwrap();
        patch.set("PVP_ENABLED", false).unwrap();
        flags.apply(&patch);

        assert!(flags.can_place);
        assert!(!flags.pvp_enabled);
        assert!(!flags.can_break);
        assert!(flags.mob_spawning);
    }

    #[test]
    fn test_flags_patch_rejects_unknown_names() {
        let mut patch = FlagsPatch::default();
        let err = patch.set("__class__", true).unwrap_err();
        assert!(matches!(err, ClaimError::UnknownFlag(name) if name == "__class__"));
        assert!(patch.is_empty());
    }

    #[test]
    fn test_flags_patch_deserialization_rejects_unknown_fields() {
        let ok: FlagsPatch = serde_json::from_str(r#"{"can_break": true}"#).unwrap();
        assert_eq!(ok.can_break, Some(true));
        assert_eq!(ok.can_place, None);

        let bad = serde_json::from_str::<FlagsPatch>(r#"{"can_fly": true}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_block_pos_try_from_location_rejects_unusable_coordinates() {
        assert_eq!(
            BlockPos::try_from_location(1.9, 64.0, -0.5),
            Ok(BlockPos::new(1, 64, -1))
        );
        assert!(BlockPos::try_from_location(f64::NAN, 64.0, 0.0).is_err());
        assert!(BlockPos::try_from_location(0.0, f64::INFINITY, 0.0).is_err());
        assert!(BlockPos::try_from_location(0.0, 64.0, 1e300).is_err());
        assert!(BlockPos::try_from_location(f64::from(i32::MAX) + 1.0, 64.0, 0.0).is_err());
        assert_eq!(
            BlockPos::try_from_location(f64::from(i32::MIN), 64.0, f64::from(i32::MAX) + 0.5),
            Ok(BlockPos::new(i32::MIN, 64, i32::MAX))
        );
    }

    #[test]
    fn test_block_pos_from_location_floors() {
        assert_eq!(BlockPos::from_location(1.9, 64.0, -0.5), BlockPos::new(1, 64, -1));
    }
}
