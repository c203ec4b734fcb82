//! Bounding box of a track.
//!
//! Step 2 of the pipeline.  Points are treated as planar coordinates
//! (first field on x, second on y), matching the flat projection used
//! by the layout planner.

use geo::BoundingRect;

use crate::types::{BoundingBox, GeoPoint, TrackError};

/// Compute the minimal axis-aligned box containing every point.
///
/// # Errors
///
/// Returns [`TrackError::EmptyCoordinates`] if `points` is empty.
pub fn compute_bounding_box(points: &[GeoPoint]) -> Result<BoundingBox, TrackError> {
    let multi_point: geo::MultiPoint<f64> = points
        .iter()
        .map(|p| geo::Point::new(p.latitude, p.longitude))
        .collect();

    let rect = multi_point
        .bounding_rect()
        .ok_or(TrackError::EmptyCoordinates)?;

    Ok(BoundingBox {
        lat_min: rect.min().x,
        lat_max: rect.max().x,
        lon_min: rect.min().y,
        lon_max: rect.max().y,
    })
}
