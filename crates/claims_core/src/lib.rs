//! # Claims Core
//!
//! Protection of rectangular land claims ("regions") on a voxel game server.
//! For every block or container event the server asks: is this coordinate
//! claimed, and may this player act there? This crate answers that from memory.
//!
//! ## Module Organization
//!
//! - [`types`] - Regions, bounds, flags and members
//! - [`geometry`] - Interval overlap and claim bounds derivation
//! - [`spatial`] - R*-tree index over region footprints
//! - [`cache`] - The region cache mirroring the durable store
//! - [`auth`] - Owner / member / flag permission evaluation
//! - [`store`] - Interface of the durable region store
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust
//! use claims_core::{auth, geometry::compute_claim_bounds, Flags, Region, RegionCache, RegionId};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let mut cache = RegionCache::new();
//! cache.add(Region {
//!     id: RegionId(1),
//!     name: "home".into(),
//!     owner: "alice".into(),
//!     world: "overworld".into(),
//!     bounds: Some(compute_claim_bounds(5.0, 65.0, 5.0, 11).unwrap()),
//!     flags: Some(Flags::default()),
//!     members: Vec::new(),
//!     created_at: now,
//!     updated_at: now,
//! });
//!
//! let home = cache.find_at_point("overworld", 5, 5, Some(65)).unwrap();
//! assert!(auth::can_place(&cache, home, "alice"));
//! assert!(!auth::can_place(&cache, home, "bob"));
//! ```

pub mod auth;
pub mod cache;
pub mod error;
pub mod geometry;
pub mod spatial;
pub mod store;
pub mod types;

pub use auth::Permission;
pub use cache::{CacheStats, RegionCache};
pub use error::{ClaimError, StoreError};
pub use spatial::{SpatialIndex, SpatialIndexStats};
pub use store::RegionStore;
pub use types::{
    BlockPos, Bounds, BoundsPatch, FlagKind, Flags, FlagsPatch, Member, NewRegion, Region,
    RegionId,
};
