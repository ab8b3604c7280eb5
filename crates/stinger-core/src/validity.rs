// crates/stinger-core/src/validity.rs
//
// Fallback / validity manager.
//
// Runs first on every (re)configuration. A file that fails to probe, or
// that decodes to one frame or fewer, puts the instance in the invalid
// state: cut frame and frame count are forced to 1, the placeholder image
// becomes the only texture, and the host gets a short fixed duration.

use std::path::Path;
use tracing::{debug, warn};

use crate::backend::MediaProber;
use crate::error::StingerError;
use crate::host::{GraphicsHost, TransitionHost};
use crate::media_types::ProbeReport;
use crate::settings::{StingerConfig, StingerSettings};
use crate::upload::TextureSlot;

/// Frame count and cut frame recorded for invalid media.
pub const INVALID_FRAME_SENTINEL: u64 = 1;

#[derive(Clone, Debug, PartialEq)]
pub enum ValidityResult {
    Valid {
        report:    ProbeReport,
        /// Requested cut frame clamped to `[1, report.frame_count]`.
        cut_frame: u64,
    },
    Invalid {
        /// `None` when the path was empty or the file had too few frames.
        reason: Option<StingerError>,
    },
}

impl ValidityResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidityResult::Valid { .. })
    }

    pub fn total_frames(&self) -> u64 {
        match self {
            ValidityResult::Valid { report, .. } => report.frame_count,
            ValidityResult::Invalid { .. }       => INVALID_FRAME_SENTINEL,
        }
    }

    pub fn cut_frame(&self) -> u64 {
        match self {
            ValidityResult::Valid { cut_frame, .. } => *cut_frame,
            ValidityResult::Invalid { .. }          => INVALID_FRAME_SENTINEL,
        }
    }
}

/// Clamp a user-entered cut frame to `[1, total]`.
pub fn clamp_cut_frame(requested: i64, total: u64) -> u64 {
    let total = total.max(1);
    (requested.max(1) as u64).min(total)
}

/// Probe `path` and decide whether it can be played as a stinger.
pub fn assess<P: MediaProber + ?Sized>(prober: &P, path: &str, requested_cut: i64) -> ValidityResult {
    if path.is_empty() {
        debug!("[stinger] no stinger path configured");
        return ValidityResult::Invalid { reason: None };
    }

    match prober.probe(Path::new(path)) {
        Ok(report) if report.is_valid() => {
            let cut_frame = clamp_cut_frame(requested_cut, report.frame_count);
            ValidityResult::Valid { report, cut_frame }
        }
        Ok(report) => {
            warn!(path, frames = report.frame_count, "[stinger] stinger video has too few frames");
            ValidityResult::Invalid { reason: None }
        }
        Err(e) => {
            warn!(path, "[stinger] {e}");
            ValidityResult::Invalid { reason: Some(e) }
        }
    }
}

/// Put the instance's texture, settings and host duration into the invalid state.
///
/// Returns the fixed duration reported to the host.
pub fn enter_fallback<H: GraphicsHost + TransitionHost + ?Sized>(
    slot:     &mut TextureSlot,
    host:     &mut H,
    settings: &mut StingerSettings,
    config:   &StingerConfig,
) -> u32 {
    settings.number_of_frames = INVALID_FRAME_SENTINEL as i64;
    settings.cut_frame        = INVALID_FRAME_SENTINEL as i64;

    slot.show_placeholder(host, &config.placeholder_path());

    host.enable_fixed_duration(config.invalid_duration_ms);
    config.invalid_duration_ms
}
