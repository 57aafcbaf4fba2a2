//! Permission evaluation inside a claimed region.
//!
//! Three tiers, checked in order with short-circuit:
//! 1. the owner may do anything,
//! 2. a member may do anything,
//! 3. everyone else gets the region's flag value (false if the region has no flags).

use crate::cache::RegionCache;
use crate::types::{FlagKind, Region};

/// Actions guarded by a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Break,
    Place,
    OpenContainers,
}

impl Permission {
    /// Flag consulted for non-owner, non-member actors.
    pub const fn flag(self) -> FlagKind {
        match self {
            Permission::Break => FlagKind::CanBreak,
            Permission::Place => FlagKind::CanPlace,
            Permission::OpenContainers => FlagKind::CanOpenChests,
        }
    }
}

/// Decides whether `actor` may perform `permission` in `region`.
pub fn is_allowed(cache: &RegionCache, region: &Region, actor: &str, permission: Permission) -> bool {
    if region.owner == actor {
        return true;
    }
    if cache.is_member(region.id, actor) {
        return true;
    }
    region
        .flags
        .map_or(false, |flags| flags.get(permission.flag()))
}

pub fn can_break(cache: &RegionCache, region: &Region, actor: &str) -> bool {
    is_allowed(cache, region, actor, Permission::Break)
}

pub fn can_place(cache: &RegionCache, region: &Region, actor: &str) -> bool {
    is_allowed(cache, region, actor, Permission::Place)
}

pub fn can_open_chests(cache: &RegionCache, region: &Region, actor: &str) -> bool {
    is_allowed(cache, region, actor, Permission::OpenContainers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Flags, Member, RegionId};
    use chrono::Utc;

    fn region(flags: Option<Flags>) -> Region {
        let now = Utc::now();
        Region {
            id: RegionId(1),
            name: "home".to_string(),
            owner: "alice".to_string(),
            world: "overworld".to_string(),
            bounds: None,
            flags,
            members: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn cache_with(region: &Region) -> RegionCache {
        let mut cache = RegionCache::new();
        cache.add(region.clone());
        cache
    }

    const ALL: [Permission; 3] = [Permission::Break, Permission::Place, Permission::OpenContainers];

    #[test]
    fn test_owner_always_allowed() {
        let home = region(Some(Flags::default()));
        let cache = cache_with(&home);
        for permission in ALL {
            assert!(is_allowed(&cache, &home, "alice", permission));
        }
        let flagless = region(None);
        assert!(can_break(&cache, &flagless, "alice"));
    }

    #[test]
    fn test_member_always_allowed() {
        let home = region(Some(Flags::default()));
        let mut cache = cache_with(&home);
        cache.add_member(
            home.id,
            Member {
                player_name: "bob".to_string(),
                added_at: Utc::now(),
            },
        );
        for permission in ALL {
            assert!(is_allowed(&cache, &home, "bob", permission));
        }
    }

    #[test]
    fn test_stranger_gets_flag_value() {
        let flags = Flags {
            can_break: true,
            can_place: false,
            can_open_chests: true,
            ..Flags::default()
        };
        let home = region(Some(flags));
        let cache = cache_with(&home);

        assert!(can_break(&cache, &home, "carol"));
        assert!(!can_place(&cache, &home, "carol"));
        assert!(can_open_chests(&cache, &home, "carol"));
    }

    #[test]
    fn test_stranger_denied_without_flags() {
        let home = region(None);
        let cache = cache_with(&home);
        for permission in ALL {
            assert!(!is_allowed(&cache, &home, "carol", permission));
        }
    }
}
