//! Point projection from coordinate space onto the canvas.
//!
//! ```text
//! offset_x_scale = (latitude - lat_min) * unit_x
//! offset_y_scale = (lon_max - longitude) * unit_y
//! pixel_x        = offset_x_scale * track_width  + track_width_padding
//! pixel_y        = offset_y_scale * track_height + track_height_padding
//! ```
//!
//! The vertical offset is measured from the upper longitude bound, so
//! larger longitudes end up nearer the top of the canvas (screen space
//! is +Y down).
//!
//! This is step 4 of the pipeline.

use crate::types::{AnnotatedPoint, AxisScale, BoundingBox, GeoPoint, Layout, PixelPoint};

/// Normalize one point against the bounding box and place it on the
/// canvas.
///
/// Returns the annotated point (carrying both offsets) and its pixel
/// position.  For points inside `bounds` both offsets lie in
/// `[0.0, 1.0]`; multiplying by the reciprocal span can land one ulp
/// outside, so those are clamped.  Points outside `bounds` are
/// extrapolated.
#[must_use]
pub fn project_point(
    point: GeoPoint,
    bounds: &BoundingBox,
    layout: &Layout,
    scale: AxisScale,
) -> (AnnotatedPoint, PixelPoint) {
    let mut offset_x_scale = (point.latitude - bounds.lat_min) * scale.unit_x;
    let mut offset_y_scale = (bounds.lon_max - point.longitude) * scale.unit_y;
    if bounds.contains(point) {
        offset_x_scale = offset_x_scale.clamp(0.0, 1.0);
        offset_y_scale = offset_y_scale.clamp(0.0, 1.0);
    }

    let annotated = AnnotatedPoint {
        latitude: point.latitude,
        longitude: point.longitude,
        offset_x_scale,
        offset_y_scale,
    };
    (annotated, to_pixel(&annotated, layout))
}

/// Canvas position of an already-annotated point.
#[must_use]
pub fn to_pixel(point: &AnnotatedPoint, layout: &Layout) -> PixelPoint {
    PixelPoint::new(
        point
            .offset_x_scale
            .mul_add(f64::from(layout.track_width), layout.track_width_padding),
        point
            .offset_y_scale
            .mul_add(f64::from(layout.track_height), layout.track_height_padding),
    )
}

/// Annotate every point of a track, preserving order.
#[must_use]
pub fn project_track(
    points: &[GeoPoint],
    bounds: &BoundingBox,
    layout: &Layout,
    scale: AxisScale,
) -> Vec<AnnotatedPoint> {
    points
        .iter()
        .map(|&p| project_point(p, bounds, layout, scale).0)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layout::{compute_axis_scale, compute_layout};
    use crate::types::TrackConfig;

    fn unit_square() -> (BoundingBox, Layout, AxisScale) {
        let bounds = BoundingBox {
            lat_min: 0.0,
            lat_max: 1.0,
            lon_min: 0.0,
            lon_max: 1.0,
        };
        let layout = compute_layout(&bounds, &TrackConfig::default()).unwrap();
        let scale = compute_axis_scale(&bounds).unwrap();
        (bounds, layout, scale)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn lower_latitude_bound_maps_to_left_edge() {
        let (bounds, layout, scale) = unit_square();
        let (annotated, pixel) = project_point(GeoPoint::new(0.0, 0.5), &bounds, &layout, scale);
        assert!(approx(annotated.offset_x_scale, 0.0));
        assert!(approx(pixel.x, 25.0));
    }

    #[test]
    fn upper_latitude_bound_maps_to_right_edge() {
        let (bounds, layout, scale) = unit_square();
        let (annotated, pixel) = project_point(GeoPoint::new(1.0, 0.5), &bounds, &layout, scale);
        assert!(approx(annotated.offset_x_scale, 1.0));
        assert!(approx(pixel.x, 525.0));
    }

    #[test]
    fn upper_longitude_bound_maps_to_top() {
        let (bounds, layout, scale) = unit_square();
        let (annotated, pixel) = project_point(GeoPoint::new(0.5, 1.0), &bounds, &layout, scale);
        assert!(approx(annotated.offset_y_scale, 0.0));
        assert!(approx(pixel.y, 25.0));
    }

    #[test]
    fn lower_longitude_bound_maps_to_bottom() {
        let (bounds, layout, scale) = unit_square();
        let (annotated, pixel) = project_point(GeoPoint::new(0.5, 0.0), &bounds, &layout, scale);
        assert!(approx(annotated.offset_y_scale, 1.0));
        assert!(approx(pixel.y, 525.0));
    }

    #[test]
    fn aspect_correction_shifts_pixels_not_offsets() {
        let bounds = BoundingBox {
            lat_min: 0.0,
            lat_max: 2.0,
            lon_min: 0.0,
            lon_max: 1.0,
        };
        let layout = compute_layout(&bounds, &TrackConfig::default()).unwrap();
        let scale = compute_axis_scale(&bounds).unwrap();
        let (annotated, pixel) = project_point(GeoPoint::new(1.0, 1.0), &bounds, &layout, scale);
        assert!(approx(annotated.offset_x_scale, 0.5));
        assert!(approx(annotated.offset_y_scale, 0.0));
        assert!(approx(pixel.x, 275.0));
        // 25 padding + (500 - 250) / 2 correction
        assert!(approx(pixel.y, 150.0));
    }

    #[test]
    fn track_keeps_order_and_coordinates() {
        let (bounds, layout, scale) = unit_square();
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ];
        let annotated = project_track(&points, &bounds, &layout, scale);
        let offsets: Vec<(f64, f64)> = annotated
            .iter()
            .map(|p| (p.offset_x_scale, p.offset_y_scale))
            .collect();
        assert_eq!(offsets, vec![(0.0, 1.0), (0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        for (a, p) in annotated.iter().zip(&points) {
            assert_eq!(GeoPoint::new(a.latitude, a.longitude), *p);
        }
    }

    #[test]
    fn reciprocal_rounding_stays_in_range() {
        // x * (1 / x) is not always exactly 1.0.
        for span in [49.0, 0.1, 0.3, 3.3, 1e-3, 7.77] {
            let bounds = BoundingBox {
                lat_min: 0.0,
                lat_max: span,
                lon_min: 0.0,
                lon_max: span,
            };
            let layout = compute_layout(&bounds, &TrackConfig::default()).unwrap();
            let scale = compute_axis_scale(&bounds).unwrap();
            let (annotated, _) =
                project_point(GeoPoint::new(span, 0.0), &bounds, &layout, scale);
            assert!(annotated.offset_x_scale <= 1.0, "span {span}");
            assert!(annotated.offset_y_scale <= 1.0, "span {span}");
        }
    }

    #[test]
    fn points_outside_bounds_extrapolate() {
        let (bounds, layout, scale) = unit_square();
        let (annotated, _) = project_point(GeoPoint::new(2.0, -1.0), &bounds, &layout, scale);
        assert!(approx(annotated.offset_x_scale, 2.0));
        assert!(approx(annotated.offset_y_scale, 2.0));
    }

    #[test]
    fn zero_scale_pins_to_padding() {
        let (bounds, layout, _) = unit_square();
        let (annotated, pixel) =
            project_point(GeoPoint::new(0.7, 0.2), &bounds, &layout, AxisScale::ZERO);
        assert!(approx(annotated.offset_x_scale, 0.0));
        assert!(approx(annotated.offset_y_scale, 0.0));
        assert!(approx(pixel.x, layout.track_width_padding));
        assert!(approx(pixel.y, layout.track_height_padding));
    }
}
