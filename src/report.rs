//! Caller-side wrapper around one analysis.
//!
//! The detector does not measure its own duration. `run_timed` opens the input, runs the
//! detector, and stamps the wall-clock time around the whole call. It is also where a
//! caller opts into degraded output after a mid-stream decode failure.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::{Duration, Instant};

use crate::detect::{AnalysisResult, MotionDetector};
use crate::error::Result;

/// One analyzed input, ready for output.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisReport {
    pub source: String,
    pub result: AnalysisResult,
    pub processing_time: Duration,
    /// Decode failure message when this report holds partial statistics.
    pub degraded: Option<String>,
}

/// Analyze `path` and time the call.
///
/// With `allow_degraded`, a mid-stream decode failure yields a report built from the
/// partial statistics instead of an error. Open failures are always errors.
pub fn run_timed(
    detector: &MotionDetector,
    path: &str,
    allow_degraded: bool,
) -> Result<AnalysisReport> {
    log::info!("starting video analysis: {}", path);
    let start = Instant::now();
    let outcome = detector.analyze_path(path);
    let processing_time = start.elapsed();

    match outcome {
        Ok(result) => {
            log::info!(
                "analysis of {} took {:.2}s",
                path,
                processing_time.as_secs_f64()
            );
            Ok(AnalysisReport {
                source: path.to_string(),
                result,
                processing_time,
                degraded: None,
            })
        }
        Err(err) if allow_degraded => match err.partial_result() {
            Some(partial) => {
                log::warn!("{}: reporting partial statistics ({})", path, err);
                Ok(AnalysisReport {
                    source: path.to_string(),
                    result: partial.clone(),
                    processing_time,
                    degraded: Some(err.to_string()),
                })
            }
            None => Err(err),
        },
        Err(err) => {
            log::error!("error during video processing of {}: {}", path, err);
            Err(err)
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Serialize)]
struct ReportJson<'a> {
    source: &'a str,
    motion_detected: bool,
    frames_analyzed: u64,
    processing_time: f64,
    total_frames: u64,
    motion_percentage: f64,
    avg_motion_intensity: f64,
    video_info: VideoInfoJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    degraded: Option<&'a str>,
}

#[derive(Serialize)]
struct VideoInfoJson {
    fps: f64,
    duration_seconds: f64,
    resolution: String,
}

impl Serialize for AnalysisReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let result = &self.result;
        ReportJson {
            source: &self.source,
            motion_detected: result.motion_detected,
            frames_analyzed: result.frames_analyzed,
            processing_time: round_to(self.processing_time.as_secs_f64(), 3),
            total_frames: result.total_frames,
            motion_percentage: round_to(result.motion_percentage, 2),
            avg_motion_intensity: round_to(result.avg_motion_intensity, 3),
            video_info: VideoInfoJson {
                fps: round_to(result.video_info.fps, 2),
                duration_seconds: round_to(result.duration_seconds, 2),
                resolution: result.video_info.resolution(),
            },
            degraded: self.degraded.as_deref(),
        }
        .serialize(serializer)
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = &self.result;
        writeln!(f, "{}", self.source)?;
        if let Some(reason) = &self.degraded {
            writeln!(f, "  DEGRADED: {}", reason)?;
        }
        writeln!(
            f,
            "  motion detected:   {}",
            if result.motion_detected { "yes" } else { "no" }
        )?;
        writeln!(
            f,
            "  motion:            {:.2}% ({} of {} analyzed frames)",
            result.motion_percentage, result.motion_frames, result.frames_analyzed
        )?;
        writeln!(f, "  avg intensity:     {:.3}", result.avg_motion_intensity)?;
        writeln!(
            f,
            "  video:             {} @ {:.2} fps, {} frames, {:.2}s",
            result.video_info.resolution(),
            result.video_info.fps,
            result.total_frames,
            result.duration_seconds
        )?;
        write!(
            f,
            "  processing time:   {:.3}s",
            self.processing_time.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::MotionConfig;
    use crate::error::Error;
    use crate::frame::VideoInfo;

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            source: "clip.mp4".to_string(),
            result: AnalysisResult {
                motion_detected: false,
                frames_analyzed: 50,
                frames_decoded: 250,
                motion_frames: 3,
                total_frames: 250,
                motion_percentage: 5.678,
                avg_motion_intensity: 0.123456,
                video_info: VideoInfo {
                    fps: 29.97002997,
                    width: 640,
                    height: 480,
                },
                duration_seconds: 8.341666,
            },
            processing_time: Duration::from_micros(1_234_567),
            degraded: None,
        }
    }

    #[test]
    fn json_rounds_like_the_service_output() {
        let json = serde_json::to_value(sample_report()).expect("serialize");
        assert_eq!(json["processing_time"], 1.235);
        assert_eq!(json["motion_percentage"], 5.68);
        assert_eq!(json["avg_motion_intensity"], 0.123);
        assert_eq!(json["frames_analyzed"], 50);
        assert_eq!(json["video_info"]["fps"], 29.97);
        assert_eq!(json["video_info"]["duration_seconds"], 8.34);
        assert_eq!(json["video_info"]["resolution"], "640x480");
        assert!(json.get("degraded").is_none());
    }

    #[test]
    fn display_mentions_degraded_runs() {
        let mut report = sample_report();
        report.degraded = Some("decode failed at frame 9: truncated".to_string());
        let text = report.to_string();
        assert!(text.contains("DEGRADED"));
        assert!(text.contains("5.68%"));
    }

    #[test]
    fn degraded_reports_need_opt_in() {
        let detector = MotionDetector::new(MotionConfig {
            processing_width: 64,
            processing_height: 48,
            blur_kernel_size: 5,
            ..MotionConfig::default()
        })
        .expect("valid config");
        let path = "stub://sweep?frames=40&width=64&height=48&fail_at=22";

        let err = run_timed(&detector, path, false).expect_err("strict by default");
        assert!(matches!(err, Error::DecodeInterrupted { .. }));

        let report = run_timed(&detector, path, true).expect("degraded report");
        assert!(report.degraded.is_some());
        assert_eq!(report.result.frames_decoded, 22);
        assert_eq!(report.result.frames_analyzed, 4);
    }

    #[test]
    fn open_failures_are_never_degraded() {
        let detector = MotionDetector::new(MotionConfig::default()).expect("valid config");
        let err = run_timed(&detector, "stub://nothing", true).expect_err("unreadable");
        assert!(matches!(err, Error::InputUnreadable { .. }));
    }
}
