//! # Claims Store
//!
//! Durable backends for [`claims_core::RegionStore`].
//!
//! - [`MemoryRegionStore`] - process-local table for tests and dry runs
//! - [`JsonFileRegionStore`] - the same table persisted to a JSON document
//!
//! Both assign sequential ids starting at 1, enforce unique region names and
//! hand out detached copies of every region.

mod json_file;
mod memory;
mod table;

pub use json_file::JsonFileRegionStore;
pub use memory::MemoryRegionStore;
pub use table::RegionTable;
