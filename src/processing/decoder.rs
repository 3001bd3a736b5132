//! # Barcode Decoding
//!
//! The relay treats barcode recognition as a black box behind [`FrameDecoder`]:
//! an image goes in, zero or more payload strings come out, in the order the
//! decoder found them.
//!
//! [`RxingDecoder`] (enabled by the default `rxing` feature) is the production
//! implementation. Tests substitute their own decoders.

use anyhow::Result;
use image::DynamicImage;

/// Something that can find barcodes in a frame.
///
/// Implementations run on tokio's blocking pool, so they may be CPU heavy but
/// must be `Send + Sync`.
pub trait FrameDecoder: Send + Sync {
    /// Return every payload detected in `image`. An empty vector means "no barcode".
    fn decode(&self, image: &DynamicImage) -> Result<Vec<String>>;
}

/// Multi-format barcode decoder backed by the `rxing` crate (EAN/UPC, Code 128, QR, ...).
#[cfg(feature = "rxing")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RxingDecoder;

#[cfg(feature = "rxing")]
impl RxingDecoder {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "rxing")]
impl FrameDecoder for RxingDecoder {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<String>> {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();

        // rxing reports "nothing found" as an error
        match rxing::helpers::detect_multiple_in_luma(luma.into_raw(), width, height) {
            Ok(results) => Ok(results
                .iter()
                .map(|result| result.getText().to_string())
                .filter(|text| !text.is_empty())
                .collect()),
            Err(e) => {
                log::trace!("no barcode in {}x{} frame: {}", width, height, e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(all(test, feature = "rxing"))]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_blank_frame_has_no_barcodes() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([255])));
        let results = RxingDecoder::new().decode(&blank).unwrap();
        assert!(results.is_empty());
    }
}
