// crates/stinger-core/src/error.rs
//
// Error taxonomy shared by every stinger crate.
//
// Payloads are plain strings so this crate never names an FFmpeg type;
// stinger-media maps `ffmpeg::Error` into these variants at the call site.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StingerError {
    /// The container could not be opened or parsed.
    #[error("couldn't open stinger video {path:?}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// Stream metadata was missing after the container was read.
    #[error("couldn't find stinger video stream information: {0}")]
    StreamInfo(String),

    #[error("no video stream in {0:?}")]
    NoVideoStream(PathBuf),

    #[error("unsupported codec of stinger video: {0}")]
    UnsupportedCodec(String),

    #[error("couldn't open codec of stinger video: {0}")]
    CodecOpen(String),

    /// Width/height of zero or a format pair the scaler refuses.
    #[error("unable to create sws context: {0}")]
    ScaleContext(String),

    #[error("allocation failed: {0}")]
    Allocation(String),

    /// The composite effect file could not be loaded by the host.
    #[error("could not load {0:?}")]
    EffectLoad(PathBuf),

    /// Per-packet decode anomaly. Logged and skipped, never surfaced to the host.
    #[error("decode error: {0}")]
    Decode(String),
}

impl StingerError {
    /// Errors that degrade an instance to the placeholder instead of failing it.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, StingerError::EffectLoad(_) | StingerError::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, StingerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_cover_the_recoverable_set() {
        let recoverable = [
            StingerError::Open { path: "a.mp4".into(), reason: "x".into() },
            StingerError::StreamInfo("x".into()),
            StingerError::NoVideoStream("a.mp4".into()),
            StingerError::UnsupportedCodec("x".into()),
            StingerError::CodecOpen("x".into()),
            StingerError::ScaleContext("x".into()),
            StingerError::Allocation("x".into()),
        ];
        assert!(recoverable.iter().all(StingerError::is_configuration_error));
        assert!(!StingerError::Decode("x".into()).is_configuration_error());
        assert!(!StingerError::EffectLoad("fx".into()).is_configuration_error());
    }

    #[test]
    fn open_error_names_the_path() {
        let e = StingerError::Open { path: "clip.webm".into(), reason: "No such file".into() };
        assert!(e.to_string().contains("clip.webm"));
    }
}
