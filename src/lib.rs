//! VisionGuard motion detection.
//!
//! This crate decides whether a video contains motion and summarizes how much of it
//! moves, using frame differencing.
//!
//! # Architecture
//!
//! Two components make up the pipeline:
//!
//! 1. **Frame Source** (`ingest`): opens a container, reports metadata and a best-effort
//!    frame count, and yields decoded frames one at a time. Closing is `Drop`.
//! 2. **Motion Detector** (`detect`): samples every Nth frame, normalizes it (resize,
//!    luma, Gaussian blur), differences it against the previous sampled frame, and
//!    aggregates the comparisons into an `AnalysisResult`.
//!
//! Everything else is caller-side plumbing around one synchronous call:
//!
//! - `config`: settings file + environment, assembling a `MotionConfig`
//! - `report`: timing a run and serializing its outcome
//! - `ui`: terminal progress for the command-line front-end
//!
//! # Module Structure
//!
//! - `frame`: decoded frame container and stream metadata
//! - `ingest`: frame sources (FFmpeg files, synthetic `stub://` scenes)
//! - `detect`: detector configuration, backends, aggregation
//! - `error`: the error taxonomy shared by all of the above

pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod report;
pub mod ui;

pub use detect::{
    AnalysisResult, CpuBackend, MotionBackend, MotionConfig, MotionDetector, MotionObservation,
    MOTION_DECISION_PERCENT,
};
pub use error::{Error, Result};
pub use frame::{RawFrame, VideoInfo};
pub use ingest::{DecodeFailure, FrameSource, Scene, SyntheticConfig, SyntheticSource, VideoFile};
pub use report::{run_timed, AnalysisReport};
