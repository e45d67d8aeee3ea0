use serde::Serialize;

use crate::error::{Error, Result};

/// Percentage of motion-flagged comparisons above which a whole video counts as motion.
pub const MOTION_DECISION_PERCENT: f64 = 10.0;

pub const DEFAULT_SAMPLE_STRIDE: u32 = 5;
pub const DEFAULT_MOTION_THRESHOLD: f64 = 0.02;
pub const DEFAULT_PROCESSING_WIDTH: u32 = 640;
pub const DEFAULT_PROCESSING_HEIGHT: u32 = 480;
pub const DEFAULT_BLUR_KERNEL_SIZE: u32 = 21;
pub const DEFAULT_PIXEL_DELTA_THRESHOLD: u8 = 25;
pub const DEFAULT_DILATION_KERNEL_SIZE: u32 = 5;
pub const DEFAULT_DILATION_ITERATIONS: u32 = 2;

/// Largest accepted processing width or height.
pub const MAX_PROCESSING_DIMENSION: u32 = 7680;
/// Smallest kernel that still smooths or grows anything.
pub const MIN_KERNEL_SIZE: u32 = 3;
pub const MAX_DILATION_ITERATIONS: u32 = 16;

/// Immutable detector parameters.
///
/// `Default` gives the standard tuning. The detector never fills in missing values on
/// its own; whoever assembles the config decides every field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotionConfig {
    /// Analyze every Nth decoded frame.
    pub sample_stride: u32,
    /// Minimum fraction of changed pixels for a comparison to count as motion. In (0, 1).
    pub motion_threshold: f64,
    /// Width every frame is resized to before comparison.
    pub processing_width: u32,
    /// Height every frame is resized to before comparison.
    pub processing_height: u32,
    /// Side of the Gaussian smoothing kernel. Odd.
    pub blur_kernel_size: u32,
    /// A pixel is "changed" when its absolute difference exceeds this.
    pub pixel_delta_threshold: u8,
    /// Side of the square dilation structuring element. Odd.
    pub dilation_kernel_size: u32,
    pub dilation_iterations: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            processing_width: DEFAULT_PROCESSING_WIDTH,
            processing_height: DEFAULT_PROCESSING_HEIGHT,
            blur_kernel_size: DEFAULT_BLUR_KERNEL_SIZE,
            pixel_delta_threshold: DEFAULT_PIXEL_DELTA_THRESHOLD,
            dilation_kernel_size: DEFAULT_DILATION_KERNEL_SIZE,
            dilation_iterations: DEFAULT_DILATION_ITERATIONS,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_stride == 0 {
            return Err(invalid("sample_stride must be >= 1"));
        }
        if !(self.motion_threshold > 0.0 && self.motion_threshold < 1.0) {
            return Err(invalid(format!(
                "motion_threshold must be in (0, 1), got {}",
                self.motion_threshold
            )));
        }
        if self.processing_width == 0 || self.processing_height == 0 {
            return Err(invalid(format!(
                "processing resolution must be non-zero, got {}x{}",
                self.processing_width, self.processing_height
            )));
        }
        if self.processing_width > MAX_PROCESSING_DIMENSION
            || self.processing_height > MAX_PROCESSING_DIMENSION
        {
            return Err(invalid(format!(
                "processing resolution must be at most {}x{}, got {}x{}",
                MAX_PROCESSING_DIMENSION,
                MAX_PROCESSING_DIMENSION,
                self.processing_width,
                self.processing_height
            )));
        }
        // Kernels never exceed the shorter processing side.
        let max_kernel = self.processing_width.min(self.processing_height);
        check_kernel("blur_kernel_size", self.blur_kernel_size, max_kernel)?;
        check_kernel("dilation_kernel_size", self.dilation_kernel_size, max_kernel)?;
        if !(1..=MAX_DILATION_ITERATIONS).contains(&self.dilation_iterations) {
            return Err(invalid(format!(
                "dilation_iterations must be in 1..={}, got {}",
                MAX_DILATION_ITERATIONS, self.dilation_iterations
            )));
        }
        Ok(())
    }

    /// Gaussian sigma derived from the kernel size.
    pub fn blur_sigma(&self) -> f64 {
        0.3 * ((f64::from(self.blur_kernel_size) - 1.0) * 0.5 - 1.0) + 0.8
    }
}

fn check_kernel(name: &str, size: u32, max: u32) -> Result<()> {
    if size % 2 == 0 || size < MIN_KERNEL_SIZE || size > max {
        return Err(invalid(format!(
            "{} must be odd and in {}..={}, got {}",
            name, MIN_KERNEL_SIZE, max, size
        )));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigInvalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MotionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_stride, 5);
        assert_eq!(config.motion_threshold, 0.02);
        assert_eq!((config.processing_width, config.processing_height), (640, 480));
    }

    #[test]
    fn sigma_matches_kernel_size() {
        let config = MotionConfig::default();
        assert!((config.blur_sigma() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn smallest_kernels_are_accepted() {
        let config = MotionConfig {
            blur_kernel_size: 3,
            dilation_kernel_size: 3,
            dilation_iterations: MAX_DILATION_ITERATIONS,
            ..MotionConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            MotionConfig {
                sample_stride: 0,
                ..MotionConfig::default()
            },
            MotionConfig {
                motion_threshold: 0.0,
                ..MotionConfig::default()
            },
            MotionConfig {
                motion_threshold: 1.0,
                ..MotionConfig::default()
            },
            MotionConfig {
                motion_threshold: f64::NAN,
                ..MotionConfig::default()
            },
            MotionConfig {
                processing_width: 0,
                ..MotionConfig::default()
            },
            MotionConfig {
                processing_height: 0,
                ..MotionConfig::default()
            },
            MotionConfig {
                blur_kernel_size: 20,
                ..MotionConfig::default()
            },
            MotionConfig {
                dilation_kernel_size: 4,
                ..MotionConfig::default()
            },
            MotionConfig {
                dilation_iterations: 0,
                ..MotionConfig::default()
            },
            MotionConfig {
                blur_kernel_size: 1,
                ..MotionConfig::default()
            },
            MotionConfig {
                dilation_kernel_size: 1,
                ..MotionConfig::default()
            },
            MotionConfig {
                blur_kernel_size: u32::MAX,
                ..MotionConfig::default()
            },
            MotionConfig {
                dilation_kernel_size: 481,
                ..MotionConfig::default()
            },
            MotionConfig {
                dilation_iterations: u32::MAX,
                ..MotionConfig::default()
            },
            MotionConfig {
                processing_width: u32::MAX,
                ..MotionConfig::default()
            },
        ];
        for config in cases {
            let err = config.validate().expect_err("must be rejected");
            assert!(matches!(err, Error::ConfigInvalid(_)), "{config:?}");
        }
    }
}
