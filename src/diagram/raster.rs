//! SVG rasterization for terminal display.
//!
//! The vector output is rasterized directly at the final display width so
//! no lossy upscaling happens later in the image pipeline.

use std::sync::Arc;

use image::DynamicImage;
use resvg::usvg::fontdb;

use super::DiagramError;

/// Rasterize an SVG string to an image scaled to `target_width_px`,
/// preserving aspect ratio.
///
/// # Errors
///
/// Returns [`DiagramError::Raster`] if the SVG cannot be parsed or the
/// pixmap cannot be allocated.
pub fn rasterize_svg(svg: &str, target_width_px: u32) -> Result<DynamicImage, DiagramError> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let opts = resvg::usvg::Options {
        fontdb: Arc::new(db),
        ..Default::default()
    };

    let tree = resvg::usvg::Tree::from_str(svg, &opts)
        .map_err(|err| DiagramError::Raster(err.to_string()))?;
    let size = tree.size();

    let scale = target_width_px as f32 / size.width();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = (size.width() * scale).ceil() as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| DiagramError::Raster(format!("failed to create pixmap {width}x{height}")))?;

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let rgba = pixmap.data().to_vec();
    let img_buf = image::RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        DiagramError::Raster("failed to create image from pixmap data".to_string())
    })?;

    Ok(DynamicImage::ImageRgba8(img_buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_simple_svg() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50" width="100" height="50"><rect x="0" y="0" width="100" height="50" fill="#fff"/></svg>"##;
        let img = rasterize_svg(svg, 400).unwrap();
        assert_eq!(img.width(), 400);
        assert_eq!(img.height(), 200);
    }

    #[test]
    fn test_rasterize_invalid_svg_errors() {
        let err = rasterize_svg("<not svg>", 100).unwrap_err();
        assert!(matches!(err, DiagramError::Raster(_)));
    }
}
