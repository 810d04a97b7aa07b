//! Colorama Export Library
//!
//! Encoders and decoders that turn canvas snapshots into image files,
//! data URLs and thumbnails.

mod codec;
mod thumbnail;

pub use codec::{
    DEFAULT_GIF_DELAY_MS, DEFAULT_JPEG_QUALITY, ExportError, ExportFormat, ExportResult, data_url,
    decode_png, encode, encode_gif, encode_jpeg, encode_png, encode_svg, flatten_on_white,
    parse_data_url,
};
pub use thumbnail::{THUMBNAIL_MAX_SIZE, THUMBNAIL_QUALITY, thumbnail, thumbnail_image};
