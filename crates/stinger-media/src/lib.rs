// crates/stinger-media/src/lib.rs
//
// FFmpeg side of the stinger: probing, decoding, pixel conversion and the
// optional prefetch thread. stinger-core only sees it through
// `FfmpegBackend`, which implements `MediaBackend`.

pub mod backend;
pub mod decode;
pub mod probe;
pub mod scale;
pub mod worker;

mod helpers;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use backend::{FfmpegBackend, MediaSession};
pub use decode::{DecodeSession, NormalizePolicy, Normalizer};
pub use probe::probe_media;
pub use scale::PixelConverter;
pub use worker::{PrefetchConfig, PrefetchDecoder};
