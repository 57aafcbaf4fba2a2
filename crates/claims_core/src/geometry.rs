//! Box geometry helpers: interval overlap and claim bounds derivation.

use crate::error::ClaimError;
use crate::types::{BlockPos, Bounds};

/// Closed-interval overlap: `[a_min, a_max]` and `[b_min, b_max]` share a point.
#[inline]
pub fn intervals_overlap(a_min: i32, a_max: i32, b_min: i32, b_max: i32) -> bool {
    !(a_max < b_min || a_min > b_max)
}

/// Derives the cube claimed around an anchor location.
///
/// The anchor is floored to its block; the cube extends `(size - 1) / 2` blocks
/// from it on every axis and the anchor becomes the bounds' center. Even or zero
/// sizes are rejected since they cannot be centered on a block. Non-finite
/// locations and cubes that would leave the `i32` block range are rejected too.
///
/// # Example
///
/// ```rust
/// use claims_core::geometry::compute_claim_bounds;
///
/// let bounds = compute_claim_bounds(10.0, 64.0, 10.0, 21).unwrap();
/// assert_eq!((bounds.min_x, bounds.min_y, bounds.min_z), (0, 54, 0));
/// assert_eq!((bounds.max_x, bounds.max_y, bounds.max_z), (20, 74, 20));
/// ```
pub fn compute_claim_bounds(x: f64, y: f64, z: f64, size: u32) -> Result<Bounds, ClaimError> {
    if size == 0 || size % 2 == 0 {
        return Err(ClaimError::InvalidClaimSize(size));
    }

    let radius = i32::try_from((size - 1) / 2).map_err(|_| ClaimError::InvalidClaimSize(size))?;
    let anchor = BlockPos::try_from_location(x, y, z)?;

    let out_of_range = || {
        ClaimError::InvalidLocation(format!(
            "a size {size} claim around {anchor} leaves the block range"
        ))
    };
    let min = BlockPos::new(
        anchor.x.checked_sub(radius).ok_or_else(out_of_range)?,
        anchor.y.checked_sub(radius).ok_or_else(out_of_range)?,
        anchor.z.checked_sub(radius).ok_or_else(out_of_range)?,
    );
    let max = BlockPos::new(
        anchor.x.checked_add(radius).ok_or_else(out_of_range)?,
        anchor.y.checked_add(radius).ok_or_else(out_of_range)?,
        anchor.z.checked_add(radius).ok_or_else(out_of_range)?,
    );

    Bounds::new(min, max, anchor)
}
