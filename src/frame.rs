//! Decoded frame containers.
//!
//! - `RawFrame`: one decoded, full-colour frame at native resolution, owned by whichever
//!   pipeline stage currently holds it.
//! - `VideoInfo`: stream metadata reported by a frame source.
//!
//! Raw frames are never buffered. The detector either preprocesses a frame or drops it
//! as soon as it is pulled from the source.

use image::RgbImage;
use serde::Serialize;

/// A decoded RGB24 frame.
///
/// There is intentionally no `Clone`: a frame moves from the source into the detector
/// and is dropped there.
pub struct RawFrame {
    image: RgbImage,
    /// 0-based position in the decoded stream.
    index: u64,
}

impl RawFrame {
    pub fn new(image: RgbImage, index: u64) -> Self {
        Self { image, index }
    }

    /// Build a frame from tightly packed RGB24 bytes.
    ///
    /// Returns `None` when the buffer length does not match `width * height * 3`.
    pub fn from_rgb24(data: Vec<u8>, width: u32, height: u32, index: u64) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(|image| Self::new(image, index))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

/// Stream metadata. Informational only; never used in the motion decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct VideoInfo {
    /// Average frame rate, 0 when the container does not report one.
    pub fps: f64,
    /// Native frame width in pixels.
    pub width: u32,
    /// Native frame height in pixels.
    pub height: u32,
}

impl VideoInfo {
    /// "WIDTHxHEIGHT", as printed in reports.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
