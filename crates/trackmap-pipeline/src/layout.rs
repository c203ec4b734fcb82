//! Canvas layout planning.
//!
//! Maps a bounding box of arbitrary aspect ratio onto a square canvas:
//!
//! ```text
//! ratio         = longitude_span / latitude_span
//! track_width   = base_track_width
//! track_height  = round(track_width * ratio)
//! padding       = max(track_width, track_height) / padding_divisor
//! canvas side   = max(track_width, track_height) + 2 * padding
//! ```
//!
//! The shorter track dimension gets half the difference to the longer
//! one added to its padding, which centers the track on the canvas.
//!
//! This is step 3 of the pipeline.

use crate::types::{Axis, AxisScale, BoundingBox, Layout, TrackConfig, TrackError};

/// Compute the canvas layout for a bounding box.
///
/// `track_height` is rounded half-to-even, so a height of exactly
/// `n + 0.5` pixels lands on the even neighbour.
///
/// # Errors
///
/// Returns [`TrackError::InvalidConfig`] if `config` fails validation.
/// Returns [`TrackError::DegenerateBoundingBox`] if the latitude span is
/// zero.
/// Returns [`TrackError::UnscalableSpan`] if either span, its reciprocal,
/// or the ratio between them is not finite.
/// Returns [`TrackError::CanvasTooLarge`] if the canvas side would exceed
/// [`TrackConfig::max_canvas_dimension`].
pub fn compute_layout(bounds: &BoundingBox, config: &TrackConfig) -> Result<Layout, TrackError> {
    let latitude_span = checked_span(Axis::Latitude, bounds.latitude_span())?;
    let longitude_span = bounds.longitude_span();
    let ratio = longitude_span / latitude_span;
    if !ratio.is_finite() {
        return Err(TrackError::UnscalableSpan {
            axis: Axis::Longitude,
            span: longitude_span,
        });
    }
    layout_for_ratio(ratio, config)
}

/// Compute the canvas layout for a given height-to-width ratio.
///
/// # Errors
///
/// Returns [`TrackError::InvalidConfig`] if `config` fails validation or
/// `ratio` is negative or not finite.
/// Returns [`TrackError::CanvasTooLarge`] if the canvas side would exceed
/// [`TrackConfig::max_canvas_dimension`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn layout_for_ratio(ratio: f64, config: &TrackConfig) -> Result<Layout, TrackError> {
    config.validate()?;
    if !(ratio.is_finite() && ratio >= 0.0) {
        return Err(TrackError::InvalidConfig(format!(
            "aspect ratio must be finite and non-negative, got {ratio}"
        )));
    }

    let width = f64::from(config.base_track_width);
    let height = (width * ratio).round_ties_even();
    let longer = width.max(height);
    let padding = longer / config.padding_divisor;

    let canvas = (2.0f64).mul_add(padding, longer).trunc();
    if canvas > f64::from(config.max_canvas_dimension) {
        return Err(TrackError::CanvasTooLarge {
            dimension: canvas,
            max: config.max_canvas_dimension,
        });
    }

    // Bounded by the canvas check above, so the casts are lossless.
    let track_width = config.base_track_width;
    let track_height = height as u32;
    let canvas_side = canvas as u32;

    let mut track_width_padding = padding;
    let mut track_height_padding = padding;
    if track_width >= track_height {
        track_height_padding += f64::from(track_width - track_height) / 2.0;
    } else {
        track_width_padding += f64::from(track_height - track_width) / 2.0;
    }

    let line_width =
        ((longer / config.line_width_divisor).trunc() as u32).max(config.min_line_width);

    Ok(Layout {
        ratio,
        track_width,
        track_height,
        padding,
        track_width_padding,
        track_height_padding,
        canvas_width: canvas_side,
        canvas_height: canvas_side,
        line_width,
    })
}

/// Layout and axis scale for a track of `point_count` points.
///
/// A single point has no extent on either axis.  Instead of failing, it
/// is laid out as a square track (ratio 1) with [`AxisScale::ZERO`], so
/// its offsets are both `0.0`.  Any other track needs a non-zero span
/// on both axes.
///
/// # Errors
///
/// Same as [`compute_layout`] and [`compute_axis_scale`].
pub fn plan_track(
    point_count: usize,
    bounds: &BoundingBox,
    config: &TrackConfig,
) -> Result<(Layout, AxisScale), TrackError> {
    if point_count == 1 {
        return Ok((layout_for_ratio(1.0, config)?, AxisScale::ZERO));
    }
    Ok((compute_layout(bounds, config)?, compute_axis_scale(bounds)?))
}

/// Per-axis unit scale factors for normalizing offsets.
///
/// # Errors
///
/// Returns [`TrackError::DegenerateBoundingBox`] naming the first axis
/// (latitude, then longitude) whose span is zero, and
/// [`TrackError::UnscalableSpan`] for a span whose reciprocal is not
/// finite.
pub fn compute_axis_scale(bounds: &BoundingBox) -> Result<AxisScale, TrackError> {
    let latitude_span = checked_span(Axis::Latitude, bounds.latitude_span())?;
    let longitude_span = checked_span(Axis::Longitude, bounds.longitude_span())?;
    Ok(AxisScale {
        unit_x: latitude_span.recip(),
        unit_y: longitude_span.recip(),
    })
}

/// Pass `span` through if it inverts to a finite, non-zero scale factor.
///
/// Subnormal spans overflow on inversion and an infinite span inverts to
/// zero; both would put NaN or a flat zero into every offset.
fn checked_span(axis: Axis, span: f64) -> Result<f64, TrackError> {
    if span == 0.0 {
        return Err(TrackError::DegenerateBoundingBox { axis });
    }
    if !(span.is_finite() && span.recip().is_finite()) {
        return Err(TrackError::UnscalableSpan { axis, span });
    }
    Ok(span)
}
