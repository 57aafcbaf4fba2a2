//! Block break and place checks.
//!
//! Breaking the anchor block of a claim is how an owner removes it: the break
//! is allowed and the region is deleted through the service.

use super::evaluate;
use crate::error::ServiceError;
use crate::events::{BlockBreakEvent, BlockPlaceEvent, Decision};
use crate::service::{RegionService, SharedRegionCache};
use claims_core::Permission;
use tracing::{debug, info};

pub async fn handle_block_break(
    service: &RegionService,
    event: &BlockBreakEvent,
) -> Result<Decision, ServiceError> {
    let anchor_of = {
        let shared = service.cache();
        let cache = shared.read().await;
        let Some(region) = cache.region_at(&event.world, event.position) else {
            return Ok(Decision::Allow);
        };

        if region.is_owned_by(&event.player) && region.is_anchor(event.position) {
            region.name.clone()
        } else {
            return Ok(evaluate(
                &cache,
                &event.world,
                event.position,
                &event.player,
                Permission::Break,
            ));
        }
    };

    match service.delete_region(&event.player, &anchor_of).await {
        Ok(region) => {
            info!("🏠 {} broke the anchor of '{}', claim removed", event.player, region.name);
            Ok(Decision::AnchorRemoved { region: region.name })
        }
        // Removed by a concurrent request between the read and the write
        Err(ServiceError::RegionNotFound(_)) => {
            debug!("🏠 Anchor region '{}' vanished before removal", anchor_of);
            Ok(Decision::Allow)
        }
        Err(e) => Err(e),
    }
}

pub async fn handle_block_place(cache: &SharedRegionCache, event: &BlockPlaceEvent) -> Decision {
    let cache = cache.read().await;
    evaluate(
        &cache,
        &event.world,
        event.position,
        &event.player,
        Permission::Place,
    )
}
