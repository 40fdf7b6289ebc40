use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

use crate::DataUrl;

/// Height of the darkened caption band at the bottom of the placeholder.
pub const BAND_HEIGHT: u32 = 80;
const BAND_OPACITY: f32 = 0.7;
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum PlaceholderError {
    #[error("cannot render placeholder: {0}")]
    Image(#[from] image::ImageError),
}

/// Stand-in result shown when processing fails: the original photo with a dark
/// band across the bottom, re-encoded as JPEG.
pub fn render_placeholder(original: &[u8]) -> Result<DataUrl, PlaceholderError> {
    let mut canvas = image::load_from_memory(original)?.to_rgb8();
    let band_top = canvas.height().saturating_sub(BAND_HEIGHT);

    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        if y >= band_top {
            for channel in pixel.0.iter_mut() {
                *channel = (f32::from(*channel) * (1.0 - BAND_OPACITY)).round() as u8;
            }
        }
    }

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY).encode_image(&canvas)?;
    Ok(DataUrl::from_bytes("image/jpeg", &encoded))
}
