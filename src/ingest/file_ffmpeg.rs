//! Local file frame source using FFmpeg.
//!
//! Decodes the best video stream of a container and converts each frame to packed RGB24
//! at native resolution. Frames are decoded on demand; at end of packets the decoder is
//! flushed so trailing frames are still delivered.

use ffmpeg_next as ffmpeg;

use super::{DecodeFailure, FrameSource};
use crate::error::{Error, Result};
use crate::frame::{RawFrame, VideoInfo};

/// `AV_TIME_BASE` as a float, for container-level durations.
const AV_TIME_BASE: f64 = 1_000_000.0;

pub(crate) struct FfmpegFileSource {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    info: VideoInfo,
    total_frames: u64,
    frames_decoded: u64,
    eof_sent: bool,
    finished: bool,
}

impl FfmpegFileSource {
    pub(crate) fn open(path: &str) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::unreadable(path, format!("initialize ffmpeg: {e}")))?;
        let input = ffmpeg::format::input(&path).map_err(|e| Error::unreadable(path, e))?;

        let (stream_index, parameters, fps, stream_secs, declared_frames) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or_else(|| Error::unreadable(path, "file has no video track"))?;
            let rate = stream.avg_frame_rate();
            let fps = if rate.denominator() == 0 {
                0.0
            } else {
                f64::from(rate)
            };
            let stream_secs = if stream.duration() > 0 {
                stream.duration() as f64 * f64::from(stream.time_base())
            } else {
                0.0
            };
            (
                stream.index(),
                stream.parameters(),
                fps,
                stream_secs,
                stream.frames(),
            )
        };

        let context = ffmpeg::codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::unreadable(path, format!("load decoder parameters: {e}")))?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| Error::unreadable(path, format!("open video decoder: {e}")))?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .map_err(|e| Error::unreadable(path, format!("create scaler: {e}")))?;

        let duration_secs = if stream_secs > 0.0 {
            stream_secs
        } else if input.duration() > 0 {
            input.duration() as f64 / AV_TIME_BASE
        } else {
            0.0
        };
        let total_frames = if declared_frames > 0 {
            declared_frames as u64
        } else {
            (duration_secs * fps).round().max(0.0) as u64
        };

        let info = VideoInfo {
            fps,
            width: decoder.width(),
            height: decoder.height(),
        };

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            info,
            total_frames,
            frames_decoded: 0,
            eof_sent: false,
            finished: false,
        })
    }

    fn failure(&self, reason: impl std::fmt::Display) -> DecodeFailure {
        DecodeFailure {
            frame_index: self.frames_decoded,
            reason: reason.to_string(),
        }
    }

    /// Pull one decoded frame out of the decoder, if one is ready.
    fn receive(&mut self) -> std::result::Result<Option<RawFrame>, DecodeFailure> {
        let mut decoded = ffmpeg::frame::Video::empty();
        match self.decoder.receive_frame(&mut decoded) {
            Ok(()) => {}
            Err(ffmpeg::Error::Other {
                errno: ffmpeg::error::EAGAIN,
            }) => return Ok(None),
            Err(ffmpeg::Error::Eof) => {
                self.finished = true;
                return Ok(None);
            }
            Err(e) => return Err(self.failure(e)),
        }

        let mut rgb_frame = ffmpeg::frame::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| self.failure(format!("scale frame to RGB: {e}")))?;
        let frame = frame_to_raw(&rgb_frame, self.frames_decoded)
            .ok_or_else(|| self.failure("ffmpeg frame row is out of bounds"))?;
        self.frames_decoded += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegFileSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn total_frame_count(&self) -> u64 {
        self.total_frames
    }

    fn next_frame(&mut self) -> std::result::Result<Option<RawFrame>, DecodeFailure> {
        loop {
            if self.finished {
                return Ok(None);
            }
            if let Some(frame) = self.receive()? {
                return Ok(Some(frame));
            }
            if self.eof_sent {
                self.finished = true;
                return Ok(None);
            }

            let mut packet = ffmpeg::Packet::empty();
            let read = packet.read(&mut self.input);
            match end_of_packets(read) {
                Ok(false) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        return Err(self.failure(format!("send packet to decoder: {e}")));
                    }
                }
                Ok(true) => {
                    if let Err(e) = self.decoder.send_eof() {
                        return Err(self.failure(format!("flush decoder: {e}")));
                    }
                    self.eof_sent = true;
                }
                Err(e) => return Err(self.failure(format!("read packet: {e}"))),
            }
        }
    }
}

/// `Ok(true)` once the demuxer is exhausted. Any other read error is a failure.
fn end_of_packets(
    read: std::result::Result<(), ffmpeg::Error>,
) -> std::result::Result<bool, ffmpeg::Error> {
    match read {
        Ok(()) => Ok(false),
        Err(ffmpeg::Error::Eof) => Ok(true),
        Err(e) => Err(e),
    }
}

fn frame_to_raw(frame: &ffmpeg::frame::Video, index: u64) -> Option<RawFrame> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        let len = row_bytes * height as usize;
        return RawFrame::from_rgb24(data.get(..len)?.to_vec(), width, height, index);
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(data.get(start..start + row_bytes)?);
    }
    RawFrame::from_rgb24(pixels, width, height, index)
}
