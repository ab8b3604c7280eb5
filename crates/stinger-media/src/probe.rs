// crates/stinger-media/src/probe.rs
//
// Media prober: exact frame count of a stinger file, plus the stream facts
// the duration calculation and the CLI need.
//
// The count comes from decoding every packet of the video stream and
// flushing the decoder. Container durations are estimates and the cut-frame
// slider must be bounded by what playback will actually present.
//
// `open_video` is shared with the decode session so both report the same
// error for the same broken file.

use std::path::Path;
use tracing::{debug, error, info, warn};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::media::Type;
use ffmpeg::util::frame::video::Video as VideoFrame;

use stinger_core::error::{Result, StingerError};
use stinger_core::media_types::{FrameRate, ProbeReport};

use crate::helpers::hw;

/// A container with its best video stream's decoder open.
pub(crate) struct OpenedVideo {
    pub ictx:       ffmpeg::format::context::Input,
    pub decoder:    ffmpeg::decoder::video::Video,
    pub video_idx:  usize,
    pub frame_rate: Option<FrameRate>,
    pub width:      u32,
    pub height:     u32,
    pub codec:      String,
    /// A hardware device was attached to the decoder.
    pub hw_active:  bool,
}

pub(crate) fn open_input(path: &Path) -> Result<ffmpeg::format::context::Input> {
    input(path).map_err(|e| StingerError::Open { path: path.to_path_buf(), reason: e.to_string() })
}

/// Open `path`, pick the best video stream and open its decoder.
pub(crate) fn open_video(path: &Path, hw_decode: bool) -> Result<OpenedVideo> {
    let ictx = open_input(path)?;

    let video_idx = ictx.streams().best(Type::Video)
        .ok_or_else(|| StingerError::NoVideoStream(path.to_path_buf()))?
        .index();

    let (mut context, frame_rate, width, height, codec) = {
        let stream = ictx.stream(video_idx)
            .ok_or_else(|| StingerError::NoVideoStream(path.to_path_buf()))?;
        let params = stream.parameters();
        let id     = params.id();
        let (w, h) = unsafe {
            let p = params.as_ptr();
            ((*p).width.max(0) as u32, (*p).height.max(0) as u32)
        };
        if id == ffmpeg::codec::Id::None || w == 0 || h == 0 {
            return Err(StingerError::StreamInfo(format!(
                "stream {video_idx}: codec {id:?}, {w}x{h}"
            )));
        }
        if ffmpeg::decoder::find(id).is_none() {
            return Err(StingerError::UnsupportedCodec(id.name().to_string()));
        }

        let avg  = stream.avg_frame_rate();
        let rate = FrameRate::new(avg.numerator() as i64, avg.denominator() as i64);

        let context = ffmpeg::codec::context::Context::from_parameters(params)
            .map_err(|e| StingerError::Allocation(format!("codec context: {e}")))?;
        (context, rate, w, h, id.name().to_string())
    };

    let hw_active = hw_decode && hw::attach_device(&mut context);
    let decoder = context.decoder().video().map_err(|e| {
        error!("[decode] {codec} decoder open failed: {e}");
        StingerError::CodecOpen(format!("{codec}: {e}"))
    })?;

    Ok(OpenedVideo { ictx, decoder, video_idx, frame_rate, width, height, codec, hw_active })
}

/// Decode the whole file once and report what playback will see.
pub fn probe_media(path: &Path) -> Result<ProbeReport> {
    let OpenedVideo { mut ictx, mut decoder, video_idx, frame_rate, width, height, codec, .. } =
        open_video(path, false)?;

    let mut frame_count = 0u64;
    let mut decoded = VideoFrame::empty();
    for (stream, packet) in ictx.packets().flatten() {
        if stream.index() != video_idx { continue; }
        if let Err(e) = decoder.send_packet(&packet) {
            debug!("[probe] skipped packet: {e}");
            continue;
        }
        while decoder.receive_frame(&mut decoded).is_ok() {
            frame_count += 1;
        }
    }
    // Frames still buffered in the decoder (B-frame reordering, frame threads).
    if decoder.send_eof().is_ok() {
        while decoder.receive_frame(&mut decoded).is_ok() {
            frame_count += 1;
        }
    }

    let report = ProbeReport { path: path.to_path_buf(), frame_count, frame_rate, width, height, codec };
    if report.is_valid() {
        info!(path = %path.display(), frames = frame_count, "[probe] {width}x{height} {}", report.codec);
    } else {
        warn!(path = %path.display(), frames = frame_count, "[probe] not enough frames for a stinger");
    }
    Ok(report)
}
