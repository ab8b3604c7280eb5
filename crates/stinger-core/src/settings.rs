// crates/stinger-core/src/settings.rs
//
// Persisted settings for one stinger instance, plus the non-persisted
// environment the instance needs (module data directory, fallback timings).
//
// Key names are part of the on-disk format. Never rename them.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::backend::OpenOptions;
use crate::media_types::FrameRate;

/// Placeholder shown while no playable stinger is configured.
pub const PLACEHOLDER_IMAGE: &str = "NoStingerVideoLoaded.png";
/// Composite shader used by the graphics host.
pub const EFFECT_FILE: &str = "stinger_transition.effect";

/// Transition length reported to the host for invalid media.
pub const INVALID_DURATION_MS: u32 = 3000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StingerSettings {
    #[serde(rename = "stingerPath")]
    pub stinger_path:     String,
    /// 1-based frame at which the background switches from scene A to scene B.
    #[serde(rename = "cutFrame")]
    pub cut_frame:        i64,
    /// Derived by probing; written back on every update.
    #[serde(rename = "numberOfFrames")]
    pub number_of_frames: i64,
    pub hw_decode:        bool,
    pub force_scale:      bool,
    pub prefetch:         bool,
    /// Last path the property sheet probed. Avoids re-probing on every redraw.
    #[serde(rename = "prevPath")]
    pub prev_path:        String,
}

impl Default for StingerSettings {
    fn default() -> Self {
        Self {
            stinger_path:     String::new(),
            cut_frame:        1,
            number_of_frames: 1,
            hw_decode:        cfg!(windows),
            force_scale:      true,
            prefetch:         false,
            prev_path:        String::new(),
        }
    }
}

impl StingerSettings {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            hw_decode:   self.hw_decode,
            force_scale: self.force_scale,
            prefetch:    self.prefetch,
        }
    }
}

/// Runtime environment of a stinger instance. Not persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct StingerConfig {
    /// Directory holding the placeholder image and the effect file.
    pub data_dir:            PathBuf,
    pub invalid_duration_ms: u32,
    /// Used when a stream reports no frame rate.
    pub fallback_rate:       FrameRate,
}

impl Default for StingerConfig {
    fn default() -> Self {
        Self {
            data_dir:            PathBuf::from("data"),
            invalid_duration_ms: INVALID_DURATION_MS,
            fallback_rate:       FrameRate::FPS_30,
        }
    }
}

impl StingerConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), ..Self::default() }
    }

    pub fn placeholder_path(&self) -> PathBuf {
        self.data_dir.join(PLACEHOLDER_IMAGE)
    }

    pub fn effect_path(&self) -> PathBuf {
        self.data_dir.join(EFFECT_FILE)
    }
}
