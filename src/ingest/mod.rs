//! Frame sources.
//!
//! This module provides the sources that feed the motion detector:
//! - Local video files (feature: ingest-file-ffmpeg)
//! - Synthetic `stub://` scenes (testing, demos)
//!
//! Every source produces a lazy, finite, forward-only sequence of `RawFrame`s.
//! A source is responsible for:
//! - Opening the container and reporting stream metadata
//! - Reporting a best-effort total frame count
//! - Decoding frames one at a time, on demand
//!
//! A source MUST NOT:
//! - Read ahead or buffer decoded frames
//! - Restart once exhausted (reopen instead)
//! - Fetch remote URLs
//!
//! Decoder resources are released when the source is dropped.

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod synthetic;

use thiserror::Error;

use crate::frame::{RawFrame, VideoInfo};

pub use file::VideoFile;
pub use synthetic::{Scene, SyntheticConfig, SyntheticSource};

/// A frame could not be decoded partway through the stream.
#[derive(Clone, Debug, Error)]
#[error("decode failed at frame {frame_index}: {reason}")]
pub struct DecodeFailure {
    /// 0-based index of the frame that failed.
    pub frame_index: u64,
    pub reason: String,
}

/// Forward-only decoded frame sequence.
pub trait FrameSource {
    /// Stream metadata.
    fn info(&self) -> VideoInfo;

    /// Total frame count from container metadata.
    ///
    /// Best effort: may not match the number of frames `next_frame` yields.
    fn total_frame_count(&self) -> u64;

    /// Decode the next frame.
    ///
    /// `Ok(None)` marks end of stream. It is terminal: later calls keep returning `Ok(None)`.
    fn next_frame(&mut self) -> Result<Option<RawFrame>, DecodeFailure>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn info(&self) -> VideoInfo {
        (**self).info()
    }

    fn total_frame_count(&self) -> u64 {
        (**self).total_frame_count()
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame>, DecodeFailure> {
        (**self).next_frame()
    }
}
