// crates/stinger-core/src/helpers/time.rs
//
// Frame-count ↔ wall-clock conversions.

use crate::media_types::FrameRate;

/// Length of `frames` frames at `rate`, in whole milliseconds.
///
/// This is the fixed transition duration handed to the host, so progress
/// `t` spans exactly one stinger playback. Saturates at `u32::MAX`.
///
/// ```
/// use stinger_core::helpers::time::fixed_duration_ms;
/// use stinger_core::media_types::FrameRate;
/// assert_eq!(fixed_duration_ms(60, FrameRate::FPS_30), 2000);
/// assert_eq!(fixed_duration_ms(1001, FrameRate::new(30000, 1001).unwrap()), 33400);
/// ```
pub fn fixed_duration_ms(frames: u64, rate: FrameRate) -> u32 {
    let ms = frames as u128 * rate.den as u128 * 1000 / rate.num as u128;
    ms.min(u32::MAX as u128) as u32
}

/// Format a frame index as `MM:SS:FF` at `rate`.
///
/// ```
/// use stinger_core::helpers::time::format_frame;
/// use stinger_core::media_types::FrameRate;
/// assert_eq!(format_frame(0,    FrameRate::FPS_30), "00:00:00");
/// assert_eq!(format_frame(45,   FrameRate::FPS_30), "00:01:15");
/// assert_eq!(format_frame(1830, FrameRate::FPS_30), "01:01:00");
/// ```
pub fn format_frame(frame: u64, rate: FrameRate) -> String {
    let secs = frame as f64 / rate.as_f64();
    let fps  = rate.as_f64().round().max(1.0) as u64;
    let m    = (secs / 60.0) as u64;
    let sc   = (secs % 60.0) as u64;
    let fr   = frame % fps;
    format!("{m:02}:{sc:02}:{fr:02}")
}
