//! Synthetic `stub://` video source.
//!
//! Deterministic scenes for tests and demos, addressed like a file:
//!
//! ```text
//! stub://<scene>?frames=90&width=640&height=480&fps=30&fail_at=40&seed=7
//! ```
//!
//! Scenes:
//! - `static`: one uniform grey colour, every frame identical
//! - `sweep`: a white square moving horizontally across a dark frame, every frame
//! - `partial`: as `sweep`, but the square only moves during the middle third
//! - `noise`: static grey with seeded per-pixel sensor noise
//!
//! `fail_at=K` makes frame K (0-based) fail to decode.

use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{DecodeFailure, FrameSource};
use crate::frame::{RawFrame, VideoInfo};

pub(crate) const STUB_SCHEME: &str = "stub://";

const BACKGROUND_GREY: Rgb<u8> = Rgb([100, 100, 100]);
const BACKGROUND_DARK: Rgb<u8> = Rgb([50, 50, 50]);
const SQUARE: Rgb<u8> = Rgb([255, 255, 255]);
const NOISE_AMPLITUDE: i16 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    Static,
    Sweep,
    Partial,
    Noise,
}

impl Scene {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "static" => Ok(Self::Static),
            "sweep" => Ok(Self::Sweep),
            "partial" => Ok(Self::Partial),
            "noise" => Ok(Self::Noise),
            other => Err(anyhow!("unknown synthetic scene '{}'", other)),
        }
    }
}

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub scene: Scene,
    /// Number of frames before end of stream.
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    /// Reported frame rate. Only affects metadata.
    pub fps: f64,
    /// 0-based frame index that fails to decode.
    pub fail_at: Option<u64>,
    /// Seed for the `noise` scene.
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            scene: Scene::Static,
            frames: 90,
            width: 640,
            height: 480,
            fps: 30.0,
            fail_at: None,
            seed: 0,
        }
    }
}

impl SyntheticConfig {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            ..Self::default()
        }
    }

    /// Parse a `stub://scene?key=value&...` address.
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix(STUB_SCHEME)
            .ok_or_else(|| anyhow!("synthetic sources must use the {} scheme", STUB_SCHEME))?;
        let (scene, query) = rest.split_once('?').unwrap_or((rest, ""));
        let mut config = Self::new(Scene::parse(scene)?);

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("malformed query parameter '{}'", pair))?;
            match key {
                "frames" => config.frames = parse_param(key, value)?,
                "width" => config.width = parse_param(key, value)?,
                "height" => config.height = parse_param(key, value)?,
                "fps" => config.fps = parse_param(key, value)?,
                "fail_at" => config.fail_at = Some(parse_param(key, value)?),
                "seed" => config.seed = parse_param(key, value)?,
                other => return Err(anyhow!("unknown query parameter '{}'", other)),
            }
        }

        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("synthetic frame dimensions must be non-zero"));
        }
        Ok(config)
    }
}

fn parse_param<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid value '{}' for '{}'", value, key))
}

/// Deterministic in-memory decoder.
pub struct SyntheticSource {
    config: SyntheticConfig,
    next_index: u64,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            next_index: 0,
            rng,
        }
    }

    fn render(&mut self, index: u64) -> RgbImage {
        let SyntheticConfig { width, height, .. } = self.config;
        match self.config.scene {
            Scene::Static => RgbImage::from_pixel(width, height, BACKGROUND_GREY),
            Scene::Sweep => self.render_square(index),
            Scene::Partial => {
                let start = self.config.frames / 3;
                let end = (2 * self.config.frames / 3).max(start + 1);
                let step = index.clamp(start, end - 1) - start;
                self.render_square(step)
            }
            Scene::Noise => {
                let mut image = RgbImage::from_pixel(width, height, BACKGROUND_GREY);
                for pixel in image.pixels_mut() {
                    for channel in pixel.0.iter_mut() {
                        let offset = self.rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);
                        *channel = (*channel as i16 + offset).clamp(0, 255) as u8;
                    }
                }
                image
            }
        }
    }

    /// Dark frame with the square advanced `step` positions along its track.
    fn render_square(&self, step: u64) -> RgbImage {
        let SyntheticConfig { width, height, .. } = self.config;
        let side = (height * 5 / 12).max(1).min(width);
        let speed = u64::from((width / 64).max(1));
        let travel = u64::from((width - side).max(1));
        let x0 = ((step * speed) % travel) as u32;
        let y0 = (height - side) / 2;

        let mut image = RgbImage::from_pixel(width, height, BACKGROUND_DARK);
        for y in y0..y0 + side {
            for x in x0..(x0 + side).min(width) {
                image.put_pixel(x, y, SQUARE);
            }
        }
        image
    }
}

impl FrameSource for SyntheticSource {
    fn info(&self) -> VideoInfo {
        VideoInfo {
            fps: self.config.fps,
            width: self.config.width,
            height: self.config.height,
        }
    }

    fn total_frame_count(&self) -> u64 {
        self.config.frames
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame>, DecodeFailure> {
        let index = self.next_index;
        if index >= self.config.frames {
            return Ok(None);
        }
        if self.config.fail_at == Some(index) {
            return Err(DecodeFailure {
                frame_index: index,
                reason: "corrupt synthetic packet".to_string(),
            });
        }

        self.next_index += 1;
        let image = self.render(index);
        Ok(Some(RawFrame::new(image, index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scene_and_parameters() -> Result<()> {
        let config =
            SyntheticConfig::from_url("stub://sweep?frames=30&width=320&height=240&fail_at=7&seed=9")?;
        assert_eq!(config.scene, Scene::Sweep);
        assert_eq!(config.frames, 30);
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 240);
        assert_eq!(config.fail_at, Some(7));
        assert_eq!(config.seed, 9);
        assert_eq!(config.fps, 30.0);

        let bare = SyntheticConfig::from_url("stub://static")?;
        assert_eq!(bare.scene, Scene::Static);
        assert_eq!(bare.frames, 90);
        Ok(())
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(SyntheticConfig::from_url("stub://sweep?frames=many").is_err());
        assert!(SyntheticConfig::from_url("stub://sweep?colour=red").is_err());
        assert!(SyntheticConfig::from_url("stub://sweep?width=0").is_err());
        assert!(SyntheticConfig::from_url("stub://sweep?frames").is_err());
        assert!(SyntheticConfig::from_url("file://sweep").is_err());
    }

    #[test]
    fn yields_exactly_the_configured_frames() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            frames: 3,
            width: 4,
            height: 4,
            ..SyntheticConfig::default()
        });
        let mut indices = Vec::new();
        while let Some(frame) = source.next_frame().expect("decode") {
            indices.push(frame.index());
        }
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(source.next_frame().expect("terminal").is_none());
    }

    #[test]
    fn fail_at_interrupts_the_stream() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            frames: 10,
            width: 4,
            height: 4,
            fail_at: Some(2),
            ..SyntheticConfig::default()
        });
        assert!(source.next_frame().expect("frame 0").is_some());
        assert!(source.next_frame().expect("frame 1").is_some());
        let failure = source.next_frame().err().expect("frame 2 fails");
        assert_eq!(failure.frame_index, 2);
    }

    #[test]
    fn sweep_moves_the_square_every_frame() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            scene: Scene::Sweep,
            frames: 2,
            width: 128,
            height: 96,
            ..SyntheticConfig::default()
        });
        let first = source.next_frame().expect("decode").expect("frame");
        let second = source.next_frame().expect("decode").expect("frame");
        assert_eq!(first.image().get_pixel(0, 48), &SQUARE);
        assert_eq!(second.image().get_pixel(0, 48), &BACKGROUND_DARK);
        assert_eq!(second.image().get_pixel(2, 48), &SQUARE);
    }

    #[test]
    fn noise_is_reproducible_per_seed() {
        let config = SyntheticConfig {
            scene: Scene::Noise,
            frames: 1,
            width: 16,
            height: 16,
            seed: 42,
            ..SyntheticConfig::default()
        };
        let a = SyntheticSource::new(config.clone())
            .next_frame()
            .expect("decode")
            .expect("frame");
        let b = SyntheticSource::new(config)
            .next_frame()
            .expect("decode")
            .expect("frame");
        assert_eq!(a.image().as_raw(), b.image().as_raw());
        assert!(a
            .image()
            .pixels()
            .all(|p| p.0.iter().all(|&c| (80..=120).contains(&c))));
    }
}
