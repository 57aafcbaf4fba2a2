//! Container access checks.

use super::evaluate;
use crate::events::{ContainerOpenEvent, Decision};
use crate::service::SharedRegionCache;
use claims_core::Permission;

pub async fn handle_container_open(cache: &SharedRegionCache, event: &ContainerOpenEvent) -> Decision {
    let cache = cache.read().await;
    evaluate(
        &cache,
        &event.world,
        event.position,
        &event.player,
        Permission::OpenContainers,
    )
}
