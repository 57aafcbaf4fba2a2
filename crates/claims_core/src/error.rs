//! Error types for claim geometry, flag parsing and region storage.

use crate::types::RegionId;
use thiserror::Error;

/// Errors raised while validating claim input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Claim size must be a positive odd number, got {0}")]
    InvalidClaimSize(u32),

    #[error("Unknown flag: {0}")]
    UnknownFlag(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

/// Errors surfaced by a [`RegionStore`](crate::store::RegionStore) implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Region name already exists: {0}")]
    DuplicateName(String),

    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
