// crates/stinger-core/src/media_types.rs
//
// Types that flow between stinger-media and the transition state machine.
// No ffmpeg, no GPU handles — just plain data.

use std::path::PathBuf;
use serde::Serialize;

// ── Frame rate ────────────────────────────────────────────────────────────────

/// Frames per second as a rational `num/den`. Both parts are non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub const FPS_30: FrameRate = FrameRate { num: 30, den: 1 };

    /// Returns `None` for the 0/x and x/0 rates containers report when unknown.
    pub fn new(num: i64, den: i64) -> Option<Self> {
        if num <= 0 || den <= 0 || num > u32::MAX as i64 || den > u32::MAX as i64 {
            return None;
        }
        Some(Self { num: num as u32, den: den as u32 })
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

// ── Probe ─────────────────────────────────────────────────────────────────────

/// Result of fully decoding a stinger file once.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbeReport {
    pub path:        PathBuf,
    /// Exact number of frames the decoder completed, flush included.
    pub frame_count: u64,
    pub frame_rate:  Option<FrameRate>,
    pub width:       u32,
    pub height:      u32,
    pub codec:       String,
}

impl ProbeReport {
    /// A single frame (or none) is not a playable stinger.
    pub fn is_valid(&self) -> bool {
        self.frame_count > 1
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.frame_rate.map(|r| self.frame_count as f64 / r.as_f64())
    }
}

// ── Normalized frames ─────────────────────────────────────────────────────────

/// Pixel layouts the graphics host accepts for texture creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum UploadFormat {
    /// Packed 32-bit B, G, R, A. The scale path always produces this.
    Bgra,
    Rgba,
    /// Packed 32-bit with an unused fourth byte.
    Bgrx,
    /// Single 8-bit luma channel.
    R8,
    /// Y plane + interleaved UV plane at half resolution.
    Nv12,
    /// Y, U, V planes, chroma at half resolution.
    I420,
}

impl UploadFormat {
    pub fn plane_count(self) -> usize {
        match self {
            UploadFormat::Bgra | UploadFormat::Rgba | UploadFormat::Bgrx | UploadFormat::R8 => 1,
            UploadFormat::Nv12 => 2,
            UploadFormat::I420 => 3,
        }
    }

    /// `(row_bytes, rows)` of each plane for a `width`×`height` frame.
    ///
    /// Chroma dimensions round up so odd-sized frames keep their last column/row.
    pub fn plane_geometry(self, width: u32, height: u32) -> Vec<(usize, usize)> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        match self {
            UploadFormat::Bgra | UploadFormat::Rgba | UploadFormat::Bgrx => vec![(w * 4, h)],
            UploadFormat::R8   => vec![(w, h)],
            UploadFormat::Nv12 => vec![(w, h), (cw * 2, ch)],
            UploadFormat::I420 => vec![(w, h), (cw, ch), (cw, ch)],
        }
    }
}

/// One plane of a normalized frame. Rows are packed: `stride == row bytes`.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlane {
    pub data:   Vec<u8>,
    pub stride: usize,
}

/// A decoded frame whose pixels are ready for GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedFrame {
    pub width:  u32,
    pub height: u32,
    pub format: UploadFormat,
    pub planes: Vec<FramePlane>,
}

impl NormalizedFrame {
    /// Single-plane BGRA frame, the output of the scale path.
    pub fn bgra(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format: UploadFormat::Bgra,
            planes: vec![FramePlane { data, stride: width as usize * 4 }],
        }
    }

    /// True when every plane holds at least the bytes its geometry requires.
    pub fn is_complete(&self) -> bool {
        let geometry = self.format.plane_geometry(self.width, self.height);
        self.planes.len() == geometry.len()
            && self.planes.iter().zip(geometry).all(|(p, (row, rows))| {
                p.stride >= row && p.data.len() >= p.stride * rows.saturating_sub(1) + row
            })
    }
}

/// Outcome of asking a decoder for its next frame.
#[derive(Debug)]
pub enum DecodeStep {
    Frame(NormalizedFrame),
    /// No more frames. The caller holds the last uploaded texture.
    EndOfStream,
    /// A background decoder has nothing ready yet. Hold the current frame.
    Pending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_rejects_unknown_rates() {
        assert_eq!(FrameRate::new(0, 1), None);
        assert_eq!(FrameRate::new(30, 0), None);
        assert_eq!(FrameRate::new(30000, 1001).map(|r| r.num), Some(30000));
    }

    #[test]
    fn probe_report_needs_more_than_one_frame() {
        let mut report = ProbeReport {
            path:        "s.webm".into(),
            frame_count: 1,
            frame_rate:  FrameRate::new(25, 1),
            width:       64,
            height:      36,
            codec:       "vp9".into(),
        };
        assert!(!report.is_valid());
        report.frame_count = 50;
        assert!(report.is_valid());
        assert!((report.duration_secs().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn plane_geometry_rounds_chroma_up() {
        assert_eq!(UploadFormat::I420.plane_geometry(5, 3), vec![(5, 3), (3, 2), (3, 2)]);
        assert_eq!(UploadFormat::Nv12.plane_geometry(4, 4), vec![(4, 4), (4, 2)]);
        assert_eq!(UploadFormat::Bgra.plane_geometry(2, 2), vec![(8, 2)]);
    }

    #[test]
    fn bgra_frame_is_complete() {
        let f = NormalizedFrame::bgra(2, 2, vec![0; 16]);
        assert!(f.is_complete());
        let short = NormalizedFrame::bgra(2, 2, vec![0; 15]);
        assert!(!short.is_complete());
    }
}
