//! Project thumbnails.

use crate::codec::{ExportFormat, ExportResult, data_url, encode_jpeg};
use colorama_core::raster::{RasterSnapshot, SurfaceError};
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Longest edge of a project thumbnail, in pixels.
pub const THUMBNAIL_MAX_SIZE: u32 = 200;

/// JPEG quality of project thumbnails.
pub const THUMBNAIL_QUALITY: u8 = 80;

/// Scale the snapshot so it fits `max_size` on its longest edge, keeping
/// the aspect ratio. Small canvases are scaled up.
pub fn thumbnail_image(snapshot: &RasterSnapshot, max_size: u32) -> ExportResult<RasterSnapshot> {
    let (width, height) = (snapshot.width(), snapshot.height());
    let max_size = max_size.max(1) as f64;
    let scale = (max_size / width as f64).min(max_size / height as f64);
    let nw = ((width as f64 * scale).round() as u32).max(1);
    let nh = ((height as f64 * scale).round() as u32).max(1);

    let full = RgbaImage::from_raw(width, height, snapshot.pixels().to_vec()).ok_or(
        SurfaceError::DataLength {
            expected: width as usize * height as usize * 4,
            actual: snapshot.pixels().len(),
        },
    )?;
    let thumb = imageops::resize(&full, nw, nh, FilterType::Triangle);
    Ok(RasterSnapshot::from_rgba(nw, nh, thumb.into_raw())?)
}

/// JPEG data URL thumbnail, as stored on project records.
pub fn thumbnail(snapshot: &RasterSnapshot, max_size: u32) -> ExportResult<String> {
    let small = thumbnail_image(snapshot, max_size)?;
    let jpeg = encode_jpeg(&small, THUMBNAIL_QUALITY)?;
    Ok(data_url(&jpeg, ExportFormat::Jpeg.mime()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse_data_url;
    use colorama_core::color::Rgba;
    use colorama_core::raster::RasterSurface;

    #[test]
    fn test_thumbnail_keeps_aspect_ratio() {
        let wide = RasterSurface::new(400, 200).unwrap().snapshot();
        let thumb = thumbnail_image(&wide, THUMBNAIL_MAX_SIZE).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (200, 100));

        let tall = RasterSurface::new(50, 100).unwrap().snapshot();
        let thumb = thumbnail_image(&tall, THUMBNAIL_MAX_SIZE).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 200));
    }

    #[test]
    fn test_thumbnail_never_collapses() {
        let strip = RasterSurface::new(1000, 1).unwrap().snapshot();
        let thumb = thumbnail_image(&strip, 10).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (10, 1));
    }

    #[test]
    fn test_thumbnail_samples_content() {
        let mut surface = RasterSurface::new(20, 20).unwrap();
        for y in 0..20 {
            for x in 0..20 {
                surface.set_pixel(x, y, Rgba::rgb(200, 10, 10));
            }
        }
        let thumb = thumbnail_image(&surface.snapshot(), 10).unwrap();
        assert_eq!(thumb.pixel(5, 5), Some(Rgba::rgb(200, 10, 10)));
    }

    #[test]
    fn test_thumbnail_data_url_is_jpeg() {
        let snapshot = RasterSurface::new(300, 300).unwrap().snapshot();
        let url = thumbnail(&snapshot, THUMBNAIL_MAX_SIZE).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let (_, bytes) = parse_data_url(&url).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 200));
    }
}
