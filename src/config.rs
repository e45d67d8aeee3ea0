use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::detect::{
    MotionConfig, DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_DILATION_ITERATIONS,
    DEFAULT_DILATION_KERNEL_SIZE, DEFAULT_MOTION_THRESHOLD, DEFAULT_PIXEL_DELTA_THRESHOLD,
    DEFAULT_PROCESSING_HEIGHT, DEFAULT_PROCESSING_WIDTH, DEFAULT_SAMPLE_STRIDE,
};

pub const CONFIG_ENV: &str = "VISION_GUARD_CONFIG";
pub const SAMPLE_STRIDE_ENV: &str = "VISION_GUARD_SAMPLE_STRIDE";
pub const MOTION_THRESHOLD_ENV: &str = "VISION_GUARD_MOTION_THRESHOLD";
pub const PROCESSING_WIDTH_ENV: &str = "VISION_GUARD_PROCESSING_WIDTH";
pub const PROCESSING_HEIGHT_ENV: &str = "VISION_GUARD_PROCESSING_HEIGHT";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    detector: Option<DetectorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    sample_stride: Option<u32>,
    motion_threshold: Option<f64>,
    processing_width: Option<u32>,
    processing_height: Option<u32>,
    blur_kernel_size: Option<u32>,
    pixel_delta_threshold: Option<u8>,
    dilation_kernel_size: Option<u32>,
    dilation_iterations: Option<u32>,
}

/// Process-level settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub detector: MotionConfig,
}

impl Settings {
    /// Load settings from `VISION_GUARD_CONFIG` (if set), apply environment overrides,
    /// and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV).ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut settings = Self::from_file(file_cfg.unwrap_or_default());
        settings.apply_env()?;
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(file: SettingsFile) -> Self {
        let detector = file.detector.unwrap_or_default();
        Self {
            detector: MotionConfig {
                sample_stride: detector.sample_stride.unwrap_or(DEFAULT_SAMPLE_STRIDE),
                motion_threshold: detector
                    .motion_threshold
                    .unwrap_or(DEFAULT_MOTION_THRESHOLD),
                processing_width: detector
                    .processing_width
                    .unwrap_or(DEFAULT_PROCESSING_WIDTH),
                processing_height: detector
                    .processing_height
                    .unwrap_or(DEFAULT_PROCESSING_HEIGHT),
                blur_kernel_size: detector
                    .blur_kernel_size
                    .unwrap_or(DEFAULT_BLUR_KERNEL_SIZE),
                pixel_delta_threshold: detector
                    .pixel_delta_threshold
                    .unwrap_or(DEFAULT_PIXEL_DELTA_THRESHOLD),
                dilation_kernel_size: detector
                    .dilation_kernel_size
                    .unwrap_or(DEFAULT_DILATION_KERNEL_SIZE),
                dilation_iterations: detector
                    .dilation_iterations
                    .unwrap_or(DEFAULT_DILATION_ITERATIONS),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(stride) = env_value(SAMPLE_STRIDE_ENV)? {
            self.detector.sample_stride = stride;
        }
        if let Some(threshold) = env_value(MOTION_THRESHOLD_ENV)? {
            self.detector.motion_threshold = threshold;
        }
        if let Some(width) = env_value(PROCESSING_WIDTH_ENV)? {
            self.detector.processing_width = width;
        }
        if let Some(height) = env_value(PROCESSING_HEIGHT_ENV)? {
            self.detector.processing_height = height;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.detector
            .validate()
            .map_err(|e| anyhow!("invalid settings: {}", e))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_file(SettingsFile::default())
    }
}

/// Parse an environment override. Unset or blank values are ignored.
fn env_value<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value '{}'", key, raw)),
        _ => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<SettingsFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
