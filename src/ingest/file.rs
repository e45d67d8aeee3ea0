//! Local video file source.
//!
//! `VideoFile` is the handle the detector drives. It dispatches on the path:
//! - `stub://...` opens the deterministic synthetic decoder
//! - any other local path opens the FFmpeg decoder (feature: ingest-file-ffmpeg)
//!
//! The handle MUST NOT:
//! - Fetch remote URLs
//! - Store decoded frames
//! - Outlive the analysis run that opened it
//!
//! Dropping the handle closes the decoder. This happens exactly once, on every exit path.

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::synthetic::{SyntheticConfig, SyntheticSource, STUB_SCHEME};
use super::{DecodeFailure, FrameSource};
use crate::error::{Error, Result};
use crate::frame::{RawFrame, VideoInfo};

/// An opened video input.
pub struct VideoFile {
    path: String,
    backend: FileBackend,
    frames_delivered: u64,
}

enum FileBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl VideoFile {
    /// Open a video for decoding.
    ///
    /// Fails with `Error::InputUnreadable` when the container cannot be opened, has no
    /// video track, or the path names a remote resource.
    pub fn open(path: &str) -> Result<Self> {
        if !is_local_file_path(path) {
            return Err(Error::unreadable(
                path,
                "only local paths are supported (no URL schemes)",
            ));
        }

        let backend = if path.starts_with(STUB_SCHEME) {
            let config = SyntheticConfig::from_url(path).map_err(|e| Error::unreadable(path, e))?;
            FileBackend::Synthetic(SyntheticSource::new(config))
        } else {
            open_decoder(path)?
        };

        let file = Self {
            path: path.to_string(),
            backend,
            frames_delivered: 0,
        };
        let info = file.info();
        log::info!(
            "VideoFile: opened {} ({}, {:.2} fps, ~{} frames)",
            file.path,
            info.resolution(),
            info.fps,
            file.total_frame_count()
        );
        Ok(file)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Frames handed out so far.
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }
}

#[cfg(feature = "ingest-file-ffmpeg")]
fn open_decoder(path: &str) -> Result<FileBackend> {
    FfmpegFileSource::open(path).map(FileBackend::Ffmpeg)
}

#[cfg(not(feature = "ingest-file-ffmpeg"))]
fn open_decoder(path: &str) -> Result<FileBackend> {
    Err(Error::unreadable(
        path,
        "decoding video files requires the ingest-file-ffmpeg feature",
    ))
}

impl FrameSource for VideoFile {
    fn info(&self) -> VideoInfo {
        match &self.backend {
            FileBackend::Synthetic(source) => source.info(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.info(),
        }
    }

    fn total_frame_count(&self) -> u64 {
        match &self.backend {
            FileBackend::Synthetic(source) => source.total_frame_count(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.total_frame_count(),
        }
    }

    fn next_frame(&mut self) -> std::result::Result<Option<RawFrame>, DecodeFailure> {
        let frame = match &mut self.backend {
            FileBackend::Synthetic(source) => source.next_frame()?,
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame()?,
        };
        if frame.is_some() {
            self.frames_delivered += 1;
        }
        Ok(frame)
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        log::debug!(
            "VideoFile: released {} after {} frames",
            self.path,
            self.frames_delivered
        );
    }
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with(STUB_SCHEME) {
        return true;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_remote_and_empty_paths() {
        for path in ["", "   ", "rtsp://camera/stream", "https://example.com/a.mp4"] {
            let err = VideoFile::open(path).err().expect("path must be rejected");
            assert!(matches!(err, Error::InputUnreadable { .. }), "{path}: {err}");
        }
    }

    #[test]
    fn malformed_stub_url_is_unreadable() {
        let err = VideoFile::open("stub://fireworks").err().expect("unknown scene");
        assert!(matches!(err, Error::InputUnreadable { .. }));
    }

    #[cfg(not(feature = "ingest-file-ffmpeg"))]
    #[test]
    fn local_files_need_the_ffmpeg_feature() {
        let err = VideoFile::open("/tmp/video.mp4").err().expect("no decoder");
        assert!(err.to_string().contains("ingest-file-ffmpeg"));
    }

    #[test]
    fn counts_delivered_frames_until_exhausted() {
        let mut file = VideoFile::open("stub://static?frames=4&width=8&height=6").expect("open");
        assert_eq!(file.path(), "stub://static?frames=4&width=8&height=6");
        assert_eq!(file.total_frame_count(), 4);

        while file.next_frame().expect("decode").is_some() {}
        assert_eq!(file.frames_delivered(), 4);
        assert!(file.next_frame().expect("still exhausted").is_none());
        assert_eq!(file.frames_delivered(), 4);
    }
}
