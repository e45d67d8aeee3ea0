//! Frame-differencing motion detector.
//!
//! One run is a single sequential pass over a frame source:
//!
//! 1. Every decoded frame is counted (1-based). Only frames whose count is a multiple of
//!    `sample_stride` are kept; the rest are dropped on the spot.
//! 2. Kept frames are resized to the processing resolution, reduced to luma and blurred.
//! 3. Each kept frame after the first is differenced against the previous kept frame,
//!    binarized, dilated, and scored by the fraction of changed pixels.
//! 4. After end of stream the per-comparison tallies become an `AnalysisResult`.
//!
//! The run state is a value threaded through a fold. At most two preprocessed frames
//! (previous and current) are alive at any point, whatever the video length.

mod backend;
mod config;
mod cpu;
pub mod imgproc;
mod result;

use image::GrayImage;

use crate::error::{Error, Result};
use crate::frame::RawFrame;
use crate::ingest::{FrameSource, VideoFile};

pub use backend::MotionBackend;
pub use config::{
    MotionConfig, DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_DILATION_ITERATIONS,
    DEFAULT_DILATION_KERNEL_SIZE, DEFAULT_MOTION_THRESHOLD, DEFAULT_PIXEL_DELTA_THRESHOLD,
    DEFAULT_PROCESSING_HEIGHT, DEFAULT_PROCESSING_WIDTH, DEFAULT_SAMPLE_STRIDE,
    MAX_DILATION_ITERATIONS, MAX_PROCESSING_DIMENSION, MIN_KERNEL_SIZE, MOTION_DECISION_PERCENT,
};
pub use cpu::CpuBackend;
pub use result::{AnalysisResult, MotionObservation};

use result::Tally;

/// Accumulator threaded through one run.
#[derive(Default)]
struct RunState {
    tally: Tally,
    /// Last analyzed frame, after preprocessing.
    previous: Option<GrayImage>,
}

/// Video-level motion detector.
///
/// Holds only immutable configuration, so one detector can serve any number of
/// concurrent runs, each with its own source.
pub struct MotionDetector {
    config: MotionConfig,
    backend: Box<dyn MotionBackend>,
}

impl MotionDetector {
    /// Validate `config` and build a detector on the CPU backend.
    pub fn new(config: MotionConfig) -> Result<Self> {
        Self::with_backend(config, CpuBackend::new())
    }

    pub fn with_backend<B: MotionBackend + 'static>(config: MotionConfig, backend: B) -> Result<Self> {
        config.validate()?;
        log::info!(
            "MotionDetector initialized: sample_stride={}, threshold={}, resolution={}x{}, backend={}",
            config.sample_stride,
            config.motion_threshold,
            config.processing_width,
            config.processing_height,
            backend.name()
        );
        Ok(Self {
            config,
            backend: Box::new(backend),
        })
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Normalize one decoded frame for comparison.
    pub fn preprocess(&self, frame: &RawFrame) -> GrayImage {
        self.backend.preprocess(frame.image(), &self.config)
    }

    /// Compare two preprocessed frames.
    pub fn compare(&self, previous: &GrayImage, current: &GrayImage) -> MotionObservation {
        self.backend.compare(previous, current, &self.config)
    }

    /// Open `path`, analyze it, and close it again.
    ///
    /// Fails with `Error::InputUnreadable` before any frame is read when the input cannot
    /// be opened. The handle is released on every exit path.
    pub fn analyze_path(&self, path: &str) -> Result<AnalysisResult> {
        let mut file = VideoFile::open(path)?;
        self.analyze(&mut file)
    }

    /// Run the full pipeline over `source` until it is exhausted.
    ///
    /// A mid-stream decode failure returns `Error::DecodeInterrupted` carrying the
    /// statistics gathered up to that point.
    pub fn analyze<S: FrameSource + ?Sized>(&self, source: &mut S) -> Result<AnalysisResult> {
        let total_frames = source.total_frame_count();
        let video_info = source.info();
        log::debug!("total frames reported by source: {}", total_frames);

        let mut frames = std::iter::from_fn(|| source.next_frame().transpose());
        let outcome = frames.try_fold(RunState::default(), |state, frame| match frame {
            Ok(frame) => Ok(self.step(state, frame)),
            Err(failure) => Err((state, failure)),
        });

        match outcome {
            Ok(state) => {
                let result = state.tally.finalize(total_frames, video_info);
                log::debug!(
                    "analysis tallies: frames_decoded={}, frames_analyzed={}, motion_frames={}, motion_percentage={:.2}%",
                    result.frames_decoded,
                    result.frames_analyzed,
                    result.motion_frames,
                    result.motion_percentage
                );
                log::info!(
                    "video analysis completed: motion={}, frames={}",
                    result.motion_detected,
                    result.frames_analyzed
                );
                Ok(result)
            }
            Err((state, failure)) => {
                let partial = state.tally.finalize(total_frames, video_info);
                log::warn!(
                    "decode interrupted at frame {} after {} analyzed frames: {}",
                    failure.frame_index,
                    partial.frames_analyzed,
                    failure.reason
                );
                Err(Error::DecodeInterrupted {
                    frame_index: failure.frame_index,
                    reason: failure.reason,
                    partial: Box::new(partial),
                })
            }
        }
    }

    /// Fold one decoded frame into the run.
    fn step(&self, mut state: RunState, frame: RawFrame) -> RunState {
        state.tally.frames_decoded += 1;
        if state.tally.frames_decoded % u64::from(self.config.sample_stride) != 0 {
            return state;
        }
        state.tally.frames_analyzed += 1;

        let current = self.preprocess(&frame);
        drop(frame);

        if let Some(previous) = &state.previous {
            let observation = self.compare(previous, &current);
            if observation.motion {
                log::debug!(
                    "motion detected: change={:.4}, intensity={:.4}",
                    observation.change_fraction,
                    observation.intensity
                );
            }
            state.tally.record(&observation);
        }
        state.previous = Some(current);
        state
    }
}
