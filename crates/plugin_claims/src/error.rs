//! Error types for the claims plugin.

use claims_core::{ClaimError, StoreError};
use thiserror::Error;

/// Reasons a claim operation was refused or failed.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("A region named '{0}' already exists")]
    NameTaken(String),

    #[error("Claim would overlap region '{existing}'")]
    Overlap { existing: String },

    #[error("Region not found: {0}")]
    RegionNotFound(String),

    #[error("{actor} does not own region '{region}'")]
    NotOwner { region: String, actor: String },

    #[error("The owner of '{0}' cannot be added as a member")]
    OwnerIsNotMember(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Claim size {size} exceeds the maximum of {max}")]
    SizeTooLarge { size: u32, max: u32 },

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised by the plugin's event entry points.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Region cache has not been loaded")]
    NotLoaded,

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Invalid payload for '{event}': {reason}")]
    InvalidPayload { event: String, reason: String },

    #[error(transparent)]
    Service(#[from] ServiceError),
}
