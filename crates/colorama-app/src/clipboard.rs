//! System clipboard access (native only).

use colorama_core::raster::RasterSnapshot;
use std::borrow::Cow;

/// Copy the canvas to the clipboard as an image. Returns whether it worked.
pub fn copy_image(snapshot: &RasterSnapshot) -> bool {
    // arboard takes straight RGBA pixels, which is what snapshots hold.
    let image_data = arboard::ImageData {
        width: snapshot.width() as usize,
        height: snapshot.height() as usize,
        bytes: Cow::Borrowed(snapshot.pixels()),
    };

    match arboard::Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_image(image_data) {
            Ok(()) => {
                log::info!(
                    "Canvas copied to clipboard ({}x{})",
                    snapshot.width(),
                    snapshot.height()
                );
                true
            }
            Err(e) => {
                log::error!("Failed to copy canvas to clipboard: {}", e);
                false
            }
        },
        Err(e) => {
            log::error!("Failed to access clipboard: {}", e);
            false
        }
    }
}
