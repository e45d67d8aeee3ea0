use serde::Serialize;

use super::config::MOTION_DECISION_PERCENT;
use crate::frame::VideoInfo;

/// Outcome of comparing two consecutive analyzed frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionObservation {
    /// `change_fraction` exceeded the motion threshold.
    pub motion: bool,
    /// Share of pixels changed after binarization and dilation, 0..=1.
    pub change_fraction: f64,
    /// Mean absolute pixel difference before binarization, 0..=1.
    pub intensity: f64,
}

/// Final, immutable outcome of one analysis run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub motion_detected: bool,
    /// Frames selected by the sample stride.
    pub frames_analyzed: u64,
    /// Frames actually pulled from the source.
    pub frames_decoded: u64,
    /// Comparisons flagged as motion.
    pub motion_frames: u64,
    /// Container-reported frame count. Advisory only.
    pub total_frames: u64,
    /// `100 * motion_frames / frames_analyzed`, 0 when nothing was analyzed.
    pub motion_percentage: f64,
    /// Mean intensity over motion-flagged comparisons only, 0 when there were none.
    pub avg_motion_intensity: f64,
    pub video_info: VideoInfo,
    /// `total_frames / fps`, 0 when the frame rate is unknown.
    pub duration_seconds: f64,
}

/// Running counters of an analysis in progress.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tally {
    pub frames_decoded: u64,
    pub frames_analyzed: u64,
    pub motion_frames: u64,
    pub total_motion_intensity: f64,
}

impl Tally {
    /// Fold one comparison into the counters. Intensity only accumulates for motion.
    pub fn record(&mut self, observation: &MotionObservation) {
        if observation.motion {
            self.motion_frames += 1;
            self.total_motion_intensity += observation.intensity;
        }
    }

    pub fn finalize(&self, total_frames: u64, video_info: VideoInfo) -> AnalysisResult {
        let motion_percentage = if self.frames_analyzed > 0 {
            self.motion_frames as f64 / self.frames_analyzed as f64 * 100.0
        } else {
            0.0
        };
        let avg_motion_intensity = if self.motion_frames > 0 {
            self.total_motion_intensity / self.motion_frames as f64
        } else {
            0.0
        };
        let duration_seconds = if video_info.fps > 0.0 {
            total_frames as f64 / video_info.fps
        } else {
            0.0
        };

        AnalysisResult {
            motion_detected: motion_percentage > MOTION_DECISION_PERCENT,
            frames_analyzed: self.frames_analyzed,
            frames_decoded: self.frames_decoded,
            motion_frames: self.motion_frames,
            total_frames,
            motion_percentage,
            avg_motion_intensity,
            video_info,
            duration_seconds,
        }
    }
}
