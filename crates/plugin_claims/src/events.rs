//! # Claim Event Data Structures
//!
//! Events the host server forwards to the plugin and the decisions it returns.
//!
//! Every event names the acting player, the world and the target block. Events
//! arrive as JSON payloads and are deserialized with `serde`:
//!
//! ```rust
//! use plugin_claims::events::BlockBreakEvent;
//!
//! let event: BlockBreakEvent = serde_json::from_value(serde_json::json!({
//!     "player": "alice",
//!     "world": "overworld",
//!     "position": { "x": 5, "y": 65, "z": 5 }
//! }))
//! .unwrap();
//! assert_eq!(event.position.y, 65);
//! ```

use claims_core::{BlockPos, FlagKind};
use serde::{Deserialize, Serialize};

/// Entity location with sub-block precision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn block(&self) -> BlockPos {
        BlockPos::from_location(self.x, self.y, self.z)
    }
}

/// A player is about to break a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBreakEvent {
    pub player: String,
    pub world: String,
    pub position: BlockPos,
}

/// A player is about to place a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPlaceEvent {
    pub player: String,
    pub world: String,
    pub position: BlockPos,
}

/// A player is about to open a container (chest, barrel, furnace...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOpenEvent {
    pub player: String,
    pub world: String,
    pub position: BlockPos,
}

/// World effects that regions can switch on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldEffect {
    Pvp,
    MobSpawning,
    FireSpread,
    Explosions,
}

impl WorldEffect {
    /// Region flag governing this effect.
    pub const fn flag(self) -> FlagKind {
        match self {
            WorldEffect::Pvp => FlagKind::PvpEnabled,
            WorldEffect::MobSpawning => FlagKind::MobSpawning,
            WorldEffect::FireSpread => FlagKind::FireSpread,
            WorldEffect::Explosions => FlagKind::Explosions,
        }
    }
}

/// A world effect is about to happen at a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldEffectEvent {
    pub effect: WorldEffect,
    pub world: String,
    pub position: BlockPos,
}

/// Outcome of an event check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    /// Cancel the event; `region` protects the block.
    Deny { region: String },
    /// The owner broke the anchor block and the claim was removed.
    AnchorRemoved { region: String },
}

impl Decision {
    /// True if the host should let the event proceed.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Deny { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_floors_to_block() {
        let location = Location::new(-0.2, 64.9, 10.0);
        assert_eq!(location.block(), BlockPos::new(-1, 64, 10));
    }

    #[test]
    fn test_world_effect_deserializes_snake_case() {
        let event: WorldEffectEvent = serde_json::from_value(serde_json::json!({
            "effect": "fire_spread",
            "world": "overworld",
            "position": { "x": 0, "y": 0, "z": 0 }
        }))
        .unwrap();
        assert_eq!(event.effect, WorldEffect::FireSpread);
        assert_eq!(event.effect.flag(), FlagKind::FireSpread);
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(Decision::Deny { region: "home".into() }).unwrap();
        assert_eq!(json, serde_json::json!({ "decision": "deny", "region": "home" }));
        assert!(!Decision::Deny { region: "home".into() }.is_allowed());
        assert!(Decision::AnchorRemoved { region: "home".into() }.is_allowed());
    }
}
