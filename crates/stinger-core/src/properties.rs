// crates/stinger-core/src/properties.rs
//
// Property-sheet hooks. Building the sheet itself is the host's job; this
// module owns the parts with behaviour: defaults, and the cut-frame slider
// range that follows the selected file.

use std::path::Path;
use tracing::debug;

use crate::backend::MediaProber;
use crate::media_types::ProbeReport;
use crate::settings::StingerSettings;

/// Range of the "Transition at frame" slider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliderLimits {
    pub min:  i64,
    pub max:  i64,
    pub step: i64,
}

impl SliderLimits {
    pub fn up_to(max: i64) -> Self {
        Self { min: 1, max: max.max(1), step: 1 }
    }
}

pub fn defaults() -> StingerSettings {
    StingerSettings::default()
}

/// Called when the user picks a new stinger path.
///
/// Re-probes only when the path differs from the last one probed here;
/// otherwise the cached `numberOfFrames` bounds the slider.
pub fn on_path_modified<P: MediaProber + ?Sized>(
    settings: &mut StingerSettings,
    prober:   &P,
) -> SliderLimits {
    if settings.stinger_path == settings.prev_path {
        return SliderLimits::up_to(settings.number_of_frames);
    }

    let report = prober.probe(Path::new(&settings.stinger_path))
        .inspect_err(|e| debug!("[props] {e}"))
        .ok();
    settings.prev_path = settings.stinger_path.clone();
    limits_for(report.as_ref())
}

/// Slider range for a probe result: `[1, frames]` if playable, else `[1, 1]`.
pub fn limits_for(report: Option<&ProbeReport>) -> SliderLimits {
    match report {
        Some(r) if r.is_valid() => SliderLimits::up_to(r.frame_count as i64),
        _ => SliderLimits::up_to(1),
    }
}
