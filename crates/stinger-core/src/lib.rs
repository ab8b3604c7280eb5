// crates/stinger-core/src/lib.rs
//
// Stinger transition logic: settings, validity, progress tracking, the
// per-tick state machine and the host/backend interfaces it drives.
// No ffmpeg here. stinger-media implements `MediaBackend` on top of it.

pub mod audio;
pub mod backend;
pub mod error;
pub mod helpers;
pub mod host;
pub mod media_types;
pub mod progress;
pub mod properties;
pub mod settings;
pub mod transition;
pub mod upload;
pub mod validity;

#[cfg(test)]
mod testing;

pub use backend::{FrameDecoder, MediaBackend, MediaProber, OpenOptions};
pub use error::{Result, StingerError};
pub use media_types::{DecodeStep, FrameRate, NormalizedFrame, ProbeReport, UploadFormat};
pub use settings::{StingerConfig, StingerSettings};
pub use transition::{Background, PlaybackState, StingerTransition, TickReport};
