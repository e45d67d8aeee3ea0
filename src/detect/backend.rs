use image::{GrayImage, RgbImage};

use super::config::MotionConfig;
use super::result::MotionObservation;

/// Frame preprocessing and comparison primitives.
///
/// The detector owns sampling and aggregation; a backend only turns raw frames into
/// comparable rasters and compares two of them. Alternative implementations (SIMD, GPU)
/// plug in here without touching the aggregation rule.
///
/// Implementations must be deterministic: the same inputs always produce the same output.
pub trait MotionBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Normalize a decoded frame: resize to the processing resolution, convert to a
    /// single intensity channel, smooth.
    fn preprocess(&self, frame: &RgbImage, config: &MotionConfig) -> GrayImage;

    /// Compare two preprocessed frames of identical dimensions.
    fn compare(
        &self,
        previous: &GrayImage,
        current: &GrayImage,
        config: &MotionConfig,
    ) -> MotionObservation;
}
