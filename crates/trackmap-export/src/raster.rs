//! Track rasterization and PNG encoding.
//!
//! The canvas starts fully transparent and is washed with the
//! configured background colour.  The track is then stroked as one
//! path through every point in order, closing back to the first point
//! when [`TrackConfig::close_loop`] is set.  `tiny-skia` handles
//! anti-aliasing and sub-pixel positioning.

use image::{ImageEncoder, Rgba, RgbaImage};
use tiny_skia::{Color, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use trackmap_pipeline::{AnnotatedPoint, Layout, TrackConfig, to_pixel};

use crate::ExportError;

/// Render a track onto a square canvas of the layout's size.
///
/// Tracks with fewer than two points draw nothing; the result is the
/// background wash alone.
///
/// # Errors
///
/// Returns [`ExportError::Canvas`] if the pixmap cannot be allocated
/// (zero or oversized dimensions).
pub fn rasterize(
    points: &[AnnotatedPoint],
    layout: &Layout,
    config: &TrackConfig,
) -> Result<RgbaImage, ExportError> {
    let (width, height) = (layout.canvas_width, layout.canvas_height);
    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Canvas { width, height })?;

    let [r, g, b, a] = config.background;
    pixmap.fill(Color::from_rgba8(r, g, b, a));

    if let Some(path) = track_path(points, layout, config.close_loop) {
        #[allow(clippy::cast_precision_loss)]
        let stroke = Stroke {
            width: layout.line_width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        let [r, g, b, a] = config.line_color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    Ok(pixmap_to_image(&pixmap))
}

/// Build the stroke path through the projected points.
///
/// Returns `None` when there is nothing to draw.
#[allow(clippy::cast_possible_truncation)]
fn track_path(points: &[AnnotatedPoint], layout: &Layout, close_loop: bool) -> Option<Path> {
    if points.len() < 2 {
        return None;
    }

    let mut pb = PathBuilder::new();
    let mut pixels = points.iter().map(|p| to_pixel(p, layout));
    let first = pixels.next()?;
    pb.move_to(first.x as f32, first.y as f32);
    for p in pixels {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if close_loop {
        pb.close();
    }
    pb.finish()
}

/// Convert a pixmap (premultiplied RGBA) to an `RgbaImage` (straight RGBA).
fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, source) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = source.demultiply();
        *pixel = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}
