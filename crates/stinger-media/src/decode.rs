// crates/stinger-media/src/decode.rs
//
// DecodeSession: one open stinger file, decoded strictly in order, one
// frame per call.
//
// Frames leave the session normalized under exactly one policy, never
// changed for the session's lifetime:
//   ForceScale    → swscale to packed BGRA (any source format)
//   HwPassthrough → hardware surfaces downloaded and handed over as-is
//   Direct        → software frames already in an upload format, planes copied
//
// Software sessions pick the policy at open from the decoder's format. A
// hardware decoder only reveals its surface format once a frame is out, so
// hardware sessions lock the policy on the first frame (priming decodes it
// during configuration). A surface with no upload mapping scales.
//
// A packet the decoder rejects is skipped. End of stream is reported as
// `DecodeStep::EndOfStream` on every call until `restart`.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::util::frame::video::Video as VideoFrame;

use stinger_core::backend::{FrameDecoder, OpenOptions};
use stinger_core::error::{Result, StingerError};
use stinger_core::media_types::{DecodeStep, FrameRate, NormalizedFrame, UploadFormat};

use crate::helpers::{hw, planes, seek};
use crate::probe::{open_input, open_video, OpenedVideo};
use crate::scale::PixelConverter;

/// Consecutive demuxer read errors tolerated before the stream is treated as ended.
const MAX_READ_ERRORS: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalizePolicy {
    ForceScale,
    HwPassthrough(UploadFormat),
    Direct(UploadFormat),
}

impl NormalizePolicy {
    /// `native` is the decoded format mapped to an upload format, `None`
    /// when it has no direct mapping.
    pub fn select(force_scale: bool, hw_active: bool, native: Option<UploadFormat>) -> Self {
        match native {
            _ if force_scale     => NormalizePolicy::ForceScale,
            Some(f) if hw_active => NormalizePolicy::HwPassthrough(f),
            Some(f)              => NormalizePolicy::Direct(f),
            None                 => NormalizePolicy::ForceScale,
        }
    }
}

/// Turns decoded (system-memory) frames into upload-ready ones under the
/// session's policy.
pub struct Normalizer {
    force_scale: bool,
    hw_active:   bool,
    /// `None` until the first frame of a hardware session.
    policy:      Option<NormalizePolicy>,
    converter:   PixelConverter,
}

impl Normalizer {
    /// `decoder_format` is only trusted for software sessions.
    pub fn new(force_scale: bool, hw_active: bool, decoder_format: ffmpeg::format::Pixel) -> Self {
        let policy = (force_scale || !hw_active).then(|| {
            NormalizePolicy::select(force_scale, hw_active, planes::upload_format(decoder_format))
        });
        Self { force_scale, hw_active, policy, converter: PixelConverter::new() }
    }

    pub fn policy(&self) -> Option<NormalizePolicy> { self.policy }
    pub fn converter(&self) -> &PixelConverter { &self.converter }

    pub fn normalize(&mut self, frame: &VideoFrame) -> Result<NormalizedFrame> {
        let policy = match self.policy {
            Some(policy) => policy,
            None => {
                let policy = NormalizePolicy::select(
                    self.force_scale,
                    self.hw_active,
                    planes::upload_format(frame.format()),
                );
                debug!("[decode] first surface {:?}, policy {policy:?}", frame.format());
                self.policy = Some(policy);
                policy
            }
        };

        match policy {
            NormalizePolicy::ForceScale => self.converter.convert(frame),
            NormalizePolicy::HwPassthrough(expected) | NormalizePolicy::Direct(expected) => {
                if planes::upload_format(frame.format()) == Some(expected) {
                    Ok(planes::pack_frame(frame, expected))
                } else {
                    Err(StingerError::Decode(format!(
                        "{:?} frame in a {expected:?} session", frame.format()
                    )))
                }
            }
        }
    }
}

pub struct DecodeSession {
    path:       PathBuf,
    ictx:       ffmpeg::format::context::Input,
    decoder:    ffmpeg::decoder::video::Video,
    video_idx:  usize,
    normalizer: Normalizer,
    decoded:    VideoFrame,
    frame_rate: Option<FrameRate>,
    hw_active:  bool,
    /// EOF was sent to the decoder; only buffered frames remain.
    draining:   bool,
    /// Frames produced since open or the last restart.
    frames_out: u64,
}

impl DecodeSession {
    pub fn open(path: &Path, options: OpenOptions) -> Result<Self> {
        let OpenedVideo { ictx, decoder, video_idx, frame_rate, width, height, codec, hw_active } =
            open_video(path, options.hw_decode)?;

        let normalizer = Normalizer::new(options.force_scale, hw_active, decoder.format());
        info!(
            path = %path.display(),
            "[decode] opened {codec} {width}x{height} {:?}, policy {:?}, hw {hw_active}",
            decoder.format(),
            normalizer.policy(),
        );

        Ok(Self {
            path: path.to_path_buf(),
            ictx,
            decoder,
            video_idx,
            normalizer,
            decoded:    VideoFrame::empty(),
            frame_rate,
            hw_active,
            draining:   false,
            frames_out: 0,
        })
    }

    pub fn policy(&self) -> Option<NormalizePolicy> { self.normalizer.policy() }
    pub fn hw_active(&self) -> bool { self.hw_active }
    pub fn frames_out(&self) -> u64 { self.frames_out }
    pub fn converter(&self) -> &PixelConverter { self.normalizer.converter() }

    /// Next frame in decode order, or end of stream.
    pub fn decode_next(&mut self) -> Result<DecodeStep> {
        let mut read_errors = 0;
        loop {
            if self.decoder.receive_frame(&mut self.decoded).is_ok() {
                self.frames_out += 1;
                return self.normalize().map(DecodeStep::Frame);
            }
            if self.draining {
                return Ok(DecodeStep::EndOfStream);
            }

            let next = self.ictx.packets().next().map(|r| r.map(|(s, p)| (s.index(), p)));
            match next {
                Some(Ok((index, packet))) => {
                    if index != self.video_idx { continue; }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        debug!("[decode] skipped packet: {e}");
                    }
                }
                Some(Err(e)) => {
                    read_errors += 1;
                    debug!("[decode] read error: {e}");
                    if read_errors >= MAX_READ_ERRORS {
                        warn!(path = %self.path.display(), "[decode] giving up after {read_errors} read errors");
                        self.start_drain();
                    }
                }
                None => self.start_drain(),
            }
        }
    }

    /// Rewind to the first frame. Codec context and scaler are kept.
    pub fn restart(&mut self) -> Result<()> {
        if !seek::rewind(&mut self.ictx, "restart") {
            self.ictx = open_input(&self.path)?;
        }
        self.decoder.flush();
        self.draining   = false;
        self.frames_out = 0;
        Ok(())
    }

    fn start_drain(&mut self) {
        if let Err(e) = self.decoder.send_eof() {
            debug!("[decode] send_eof: {e}");
        }
        self.draining = true;
    }

    fn normalize(&mut self) -> Result<NormalizedFrame> {
        if hw::is_hw_frame(&self.decoded) {
            let downloaded = hw::download(&self.decoded)?;
            self.normalizer.normalize(&downloaded)
        } else {
            self.normalizer.normalize(&self.decoded)
        }
    }
}

impl FrameDecoder for DecodeSession {
    fn decode_next(&mut self) -> Result<DecodeStep> {
        DecodeSession::decode_next(self)
    }

    fn restart(&mut self) -> Result<()> {
        DecodeSession::restart(self)
    }

    fn frame_rate(&self) -> Option<FrameRate> {
        self.frame_rate
    }
}
