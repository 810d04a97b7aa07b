//! File format encoders for canvas snapshots.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use colorama_core::raster::{RasterSnapshot, SurfaceError};
use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::{Delay, Frame, RgbImage, RgbaImage};
use thiserror::Error;

/// JPEG quality used when the caller does not pick one.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Delay between GIF frames in milliseconds.
pub const DEFAULT_GIF_DELAY_MS: u32 = 100;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid image data: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Animation has no frames")]
    NoFrames,
    #[error("Frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
    Gif,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Png, Self::Jpeg, Self::Svg, Self::Gif];

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Svg => "svg",
            Self::Gif => "gif",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Svg => "image/svg+xml",
            Self::Gif => "image/gif",
        }
    }

    /// Format for a file extension, ignoring case and a leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "svg" => Some(Self::Svg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// Encode a snapshot in `format` with default settings. GIF output is a
/// single still frame.
pub fn encode(snapshot: &RasterSnapshot, format: ExportFormat) -> ExportResult<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Png => encode_png(snapshot)?,
        ExportFormat::Jpeg => encode_jpeg(snapshot, DEFAULT_JPEG_QUALITY)?,
        ExportFormat::Svg => encode_svg(snapshot)?.into_bytes(),
        ExportFormat::Gif => encode_gif(std::slice::from_ref(snapshot), DEFAULT_GIF_DELAY_MS)?,
    };
    log::debug!(
        "Encoded {}x{} canvas as {}: {} bytes",
        snapshot.width(),
        snapshot.height(),
        format.extension(),
        bytes.len()
    );
    Ok(bytes)
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(snapshot: &RasterSnapshot) -> ExportResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, snapshot.width(), snapshot.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(snapshot.pixels())?;
        writer.finish()?;
    }
    Ok(png_data)
}

/// Decode PNG bytes into a snapshot.
pub fn decode_png(bytes: &[u8]) -> ExportResult<RasterSnapshot> {
    let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
    let (width, height) = image.dimensions();
    Ok(RasterSnapshot::from_rgba(width, height, image.into_raw())?)
}

/// Composite the snapshot over an opaque white background.
pub fn flatten_on_white(snapshot: &RasterSnapshot) -> RgbImage {
    let mut out = RgbImage::new(snapshot.width(), snapshot.height());
    for (px, rgba) in out.pixels_mut().zip(snapshot.pixels().chunks_exact(4)) {
        let alpha = rgba[3] as u32;
        let over_white = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        *px = image::Rgb([over_white(rgba[0]), over_white(rgba[1]), over_white(rgba[2])]);
    }
    out
}

/// Encode as JPEG. JPEG has no alpha, so transparent areas come out white.
/// `quality` is clamped to 1..=100.
pub fn encode_jpeg(snapshot: &RasterSnapshot, quality: u8) -> ExportResult<Vec<u8>> {
    let flat = flatten_on_white(snapshot);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&flat)?;
    Ok(buf)
}

/// SVG document with the canvas embedded as a PNG `<image>`.
pub fn encode_svg(snapshot: &RasterSnapshot) -> ExportResult<String> {
    let href = data_url(&encode_png(snapshot)?, ExportFormat::Png.mime());
    let (w, h) = (snapshot.width(), snapshot.height());
    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<svg xmlns="http://www.w3.org/2000/svg"
     xmlns:xlink="http://www.w3.org/1999/xlink"
     width="{w}"
     height="{h}"
     viewBox="0 0 {w} {h}">
  <image x="0" y="0" width="{w}" height="{h}" xlink:href="{href}"/>
</svg>
"#
    ))
}

/// Encode frames as a looping GIF. Every frame must match the size of the
/// first.
pub fn encode_gif(frames: &[RasterSnapshot], delay_ms: u32) -> ExportResult<Vec<u8>> {
    let first = frames.first().ok_or(ExportError::NoFrames)?;
    let (width, height) = (first.width(), first.height());

    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.set_repeat(Repeat::Infinite)?;
        for (index, snapshot) in frames.iter().enumerate() {
            if snapshot.width() != width || snapshot.height() != height {
                return Err(ExportError::FrameSize {
                    index,
                    width: snapshot.width(),
                    height: snapshot.height(),
                    expected_width: width,
                    expected_height: height,
                });
            }
            let image = RgbaImage::from_raw(width, height, snapshot.pixels().to_vec()).ok_or(
                SurfaceError::DataLength {
                    expected: width as usize * height as usize * 4,
                    actual: snapshot.pixels().len(),
                },
            )?;
            let delay = Delay::from_numer_denom_ms(delay_ms, 1);
            encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))?;
        }
    }
    Ok(buf)
}

/// Base64 data URL for `bytes`.
pub fn data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn parse_data_url(url: &str) -> ExportResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ExportError::InvalidDataUrl("missing data: prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExportError::InvalidDataUrl("missing payload".to_string()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| ExportError::InvalidDataUrl("only base64 payloads are supported".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ExportError::InvalidDataUrl(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}
