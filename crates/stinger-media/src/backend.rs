// crates/stinger-media/src/backend.rs
//
// FfmpegBackend: the `MediaBackend` stinger-core drives.
//
// A session decodes inline on the caller's thread by default. With
// `OpenOptions::prefetch` it decodes on a worker thread instead and the
// caller only ever polls.

use std::path::Path;

use ffmpeg_the_third as ffmpeg;

use stinger_core::backend::{FrameDecoder, MediaBackend, MediaProber, OpenOptions};
use stinger_core::error::{Result, StingerError};
use stinger_core::media_types::{DecodeStep, FrameRate, ProbeReport};

use crate::decode::DecodeSession;
use crate::probe::probe_media;
use crate::worker::{PrefetchConfig, PrefetchDecoder};

pub enum MediaSession {
    Inline(DecodeSession),
    Prefetch(PrefetchDecoder),
}

impl FrameDecoder for MediaSession {
    fn decode_next(&mut self) -> Result<DecodeStep> {
        match self {
            MediaSession::Inline(s)   => s.decode_next(),
            MediaSession::Prefetch(p) => p.decode_next(),
        }
    }

    fn restart(&mut self) -> Result<()> {
        match self {
            MediaSession::Inline(s)   => s.restart(),
            MediaSession::Prefetch(p) => p.restart(),
        }
    }

    fn frame_rate(&self) -> Option<FrameRate> {
        match self {
            MediaSession::Inline(s)   => FrameDecoder::frame_rate(s),
            MediaSession::Prefetch(p) => FrameDecoder::frame_rate(p),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FfmpegBackend {
    prefetch: PrefetchConfig,
}

impl FfmpegBackend {
    /// Initialise FFmpeg. Safe to call more than once.
    pub fn new() -> Result<Self> {
        ffmpeg::init().map_err(|e| StingerError::Allocation(format!("ffmpeg init: {e}")))?;
        Ok(Self::default())
    }

    pub fn with_prefetch(mut self, prefetch: PrefetchConfig) -> Self {
        self.prefetch = prefetch;
        self
    }
}

impl MediaProber for FfmpegBackend {
    fn probe(&self, path: &Path) -> Result<ProbeReport> {
        probe_media(path)
    }
}

impl MediaBackend for FfmpegBackend {
    type Session = MediaSession;

    fn open(&self, path: &Path, options: OpenOptions) -> Result<MediaSession> {
        if options.prefetch {
            PrefetchDecoder::open(path, options, self.prefetch).map(MediaSession::Prefetch)
        } else {
            DecodeSession::open(path, options).map(MediaSession::Inline)
        }
    }
}
