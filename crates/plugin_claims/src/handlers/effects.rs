//! World effect checks.
//!
//! Effects have no acting player, so only the region flag applies. Outside any
//! claim every effect is allowed.

use crate::events::{Decision, WorldEffectEvent};
use crate::service::SharedRegionCache;
use tracing::debug;

pub async fn handle_world_effect(cache: &SharedRegionCache, event: &WorldEffectEvent) -> Decision {
    let cache = cache.read().await;
    let Some(region) = cache.region_at(&event.world, event.position) else {
        return Decision::Allow;
    };

    let enabled = region
        .flags
        .map_or(false, |flags| flags.get(event.effect.flag()));
    if enabled {
        Decision::Allow
    } else {
        debug!(
            "🛡️ {:?} at {} suppressed by '{}'",
            event.effect, event.position, region.name
        );
        Decision::Deny {
            region: region.name.clone(),
        }
    }
}
