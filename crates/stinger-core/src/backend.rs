// crates/stinger-core/src/backend.rs
//
// The seam between the transition state machine and the media library.
//
// stinger-media implements these traits on top of FFmpeg. The state machine
// only ever sees `DecodeStep`s and `ProbeReport`s, so it can be driven by a
// scripted decoder in tests.

use std::path::Path;

use crate::error::Result;
use crate::media_types::{DecodeStep, FrameRate, ProbeReport};

/// Per-session decode configuration, fixed when the session opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub hw_decode:   bool,
    /// Always run frames through the pixel converter.
    pub force_scale: bool,
    /// Decode on a worker thread instead of inside the render tick.
    pub prefetch:    bool,
}

/// A sequential, restartable frame source for one stinger file.
pub trait FrameDecoder {
    /// Decode and normalize the next frame in presentation order.
    fn decode_next(&mut self) -> Result<DecodeStep>;

    /// Rewind to the first frame. Keeps codec and converter state.
    fn restart(&mut self) -> Result<()>;

    fn frame_rate(&self) -> Option<FrameRate>;
}

pub trait MediaProber {
    /// Fully decode `path` once and count its frames.
    fn probe(&self, path: &Path) -> Result<ProbeReport>;
}

pub trait MediaBackend: MediaProber {
    type Session: FrameDecoder;

    fn open(&self, path: &Path, options: OpenOptions) -> Result<Self::Session>;
}
