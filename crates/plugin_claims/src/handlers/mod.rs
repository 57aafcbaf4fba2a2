//! # Event Handlers
//!
//! Translate host events into [`Decision`]s using the shared region cache.
//!
//! - [`block`] - block break (including anchor removal) and place
//! - [`container`] - container access
//! - [`effects`] - PvP, mob spawning, fire spread and explosions
//!
//! Reads take the cache read lock only for the duration of the lookup.

pub mod block;
pub mod container;
pub mod effects;

pub use block::{handle_block_break, handle_block_place};
pub use container::handle_container_open;
pub use effects::handle_world_effect;

use crate::events::Decision;
use claims_core::{auth, BlockPos, Permission, RegionCache};
use tracing::debug;

/// Owner / member / flag check for `actor` at `pos`. Unclaimed blocks are allowed.
pub(crate) fn evaluate(
    cache: &RegionCache,
    world: &str,
    pos: BlockPos,
    actor: &str,
    permission: Permission,
) -> Decision {
    let Some(region) = cache.region_at(world, pos) else {
        return Decision::Allow;
    };

    if auth::is_allowed(cache, region, actor, permission) {
        debug!("🛡️ {:?} by {} at {} allowed in '{}'", permission, actor, pos, region.name);
        Decision::Allow
    } else {
        debug!("🛡️ {:?} by {} at {} denied by '{}'", permission, actor, pos, region.name);
        Decision::Deny {
            region: region.name.clone(),
        }
    }
}
