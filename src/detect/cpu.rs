use image::{GrayImage, RgbImage};

use super::backend::MotionBackend;
use super::config::MotionConfig;
use super::imgproc;
use super::result::MotionObservation;

/// Frame-differencing on the CPU.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MotionBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn preprocess(&self, frame: &RgbImage, config: &MotionConfig) -> GrayImage {
        let resized = imgproc::resize(frame, config.processing_width, config.processing_height);
        let gray = imgproc::to_luma(&resized);
        imgproc::gaussian_blur(&gray, config.blur_kernel_size, config.blur_sigma())
    }

    fn compare(
        &self,
        previous: &GrayImage,
        current: &GrayImage,
        config: &MotionConfig,
    ) -> MotionObservation {
        let diff = imgproc::abs_diff(previous, current);
        // Raw magnitude, measured before binarization and morphology.
        let intensity = imgproc::mean(&diff) / 255.0;

        let binary = imgproc::threshold(&diff, config.pixel_delta_threshold);
        let dilated = imgproc::dilate(
            &binary,
            config.dilation_kernel_size,
            config.dilation_iterations,
        );

        let total = dilated.as_raw().len();
        let change_fraction = if total == 0 {
            0.0
        } else {
            imgproc::count_nonzero(&dilated) as f64 / total as f64
        };

        MotionObservation {
            motion: change_fraction > config.motion_threshold,
            change_fraction,
            intensity,
        }
    }
}
