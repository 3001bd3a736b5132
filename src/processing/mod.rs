//! # Frame Processing
//!
//! This module turns client frames into images and images into barcode payloads.

pub mod decoder;
pub mod frame;

// Re-export main items for convenience
pub use decoder::FrameDecoder;
#[cfg(feature = "rxing")]
pub use decoder::RxingDecoder;
pub use frame::{decode_frame, FrameError};
