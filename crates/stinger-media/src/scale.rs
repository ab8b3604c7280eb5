// crates/stinger-media/src/scale.rs
//
// PixelConverter: lazily configured swscale context that turns any decoded
// frame into packed BGRA.
//
// A stinger file keeps one geometry for its whole length, so the context is
// built once and reused. It is rebuilt only when width, height or source
// format change. A failed build clears the cached configuration so the next
// frame retries from scratch instead of reusing a half-built context.

use tracing::{debug, error};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;

use stinger_core::error::{Result, StingerError};
use stinger_core::media_types::NormalizedFrame;

use crate::helpers::planes::pack_plane;

/// The single format the scale path produces.
pub const OUTPUT_PIXEL: Pixel = Pixel::BGRA;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScaleConfig {
    width:  u32,
    height: u32,
    format: Pixel,
}

pub struct PixelConverter {
    scaler:      Option<SwsContext>,
    config:      Option<ScaleConfig>,
    output:      VideoFrame,
    allocations: u64,
}

impl Default for PixelConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelConverter {
    pub fn new() -> Self {
        Self {
            scaler:      None,
            config:      None,
            output:      VideoFrame::empty(),
            allocations: 0,
        }
    }

    /// How many times a scaling context has been built.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn is_configured(&self) -> bool {
        self.scaler.is_some()
    }

    /// Make sure the context matches `width`×`height` in `format`.
    pub fn ensure_configured(&mut self, width: u32, height: u32, format: Pixel) -> Result<()> {
        let wanted = ScaleConfig { width, height, format };
        if self.config == Some(wanted) && self.scaler.is_some() {
            return Ok(());
        }

        self.reset();
        if width == 0 || height == 0 {
            error!("[scale] invalid frame geometry {width}x{height}");
            return Err(StingerError::ScaleContext(format!("{width}x{height}")));
        }
        if format == Pixel::None {
            error!("[scale] frame has no pixel format");
            return Err(StingerError::ScaleContext("source pixel format unknown".into()));
        }

        let scaler = SwsContext::get(
            format, width, height,
            OUTPUT_PIXEL, width, height,
            Flags::BILINEAR,
        )
        .map_err(|e| {
            error!("[scale] {format:?} {width}x{height} → {OUTPUT_PIXEL:?}: {e}");
            StingerError::ScaleContext(format!("{format:?} {width}x{height}: {e}"))
        })?;

        self.scaler      = Some(scaler);
        self.config      = Some(wanted);
        self.output      = VideoFrame::new(OUTPUT_PIXEL, width, height);
        self.allocations += 1;
        debug!("[scale] configured {format:?} {width}x{height} → {OUTPUT_PIXEL:?}");
        Ok(())
    }

    /// Scale `src` to packed BGRA.
    pub fn convert(&mut self, src: &VideoFrame) -> Result<NormalizedFrame> {
        let (w, h) = (src.width(), src.height());
        self.ensure_configured(w, h, src.format())?;

        let Some(scaler) = self.scaler.as_mut() else {
            return Err(StingerError::ScaleContext("scaler missing after configuration".into()));
        };
        scaler
            .run(src, &mut self.output)
            .map_err(|e| StingerError::Decode(format!("scale: {e}")))?;

        let row_bytes = w as usize * 4;
        let data = pack_plane(self.output.data(0), self.output.stride(0), row_bytes, h as usize);
        Ok(NormalizedFrame::bgra(w, h, data))
    }

    /// Drop the context and cached configuration.
    pub fn reset(&mut self) {
        self.scaler = None;
        self.config = None;
        self.output = VideoFrame::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stinger_core::media_types::UploadFormat;

    fn yuv(w: u32, h: u32) -> VideoFrame {
        let mut frame = VideoFrame::new(Pixel::YUV420P, w, h);
        frame.data_mut(0).fill(235);
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(128);
        frame
    }

    #[test]
    fn identical_geometry_reuses_context() {
        let mut conv = PixelConverter::new();
        let a = conv.convert(&yuv(16, 8)).unwrap();
        let b = conv.convert(&yuv(16, 8)).unwrap();
        assert_eq!(conv.allocations(), 1);
        assert_eq!(a.format, UploadFormat::Bgra);
        assert_eq!(b.planes[0].data.len(), 16 * 8 * 4);
        // Near-white luma with neutral chroma scales to an opaque light pixel.
        let px = &b.planes[0].data[..4];
        assert!(px[0] > 200 && px[1] > 200 && px[2] > 200);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn geometry_change_reallocates() {
        let mut conv = PixelConverter::new();
        conv.convert(&yuv(16, 8)).unwrap();
        conv.convert(&yuv(32, 8)).unwrap();
        conv.convert(&yuv(32, 8)).unwrap();
        assert_eq!(conv.allocations(), 2);
    }

    #[test]
    fn zero_size_fails_and_clears_state() {
        let mut conv = PixelConverter::new();
        conv.ensure_configured(16, 8, Pixel::YUV420P).unwrap();
        assert!(matches!(
            conv.ensure_configured(0, 8, Pixel::YUV420P),
            Err(StingerError::ScaleContext(_))
        ));
        assert!(!conv.is_configured());
        // Retry with the old geometry rebuilds instead of reusing stale state.
        conv.ensure_configured(16, 8, Pixel::YUV420P).unwrap();
        assert_eq!(conv.allocations(), 2);
    }

    #[test]
    fn unknown_format_is_a_scale_error() {
        let mut conv = PixelConverter::new();
        assert!(matches!(
            conv.ensure_configured(16, 8, Pixel::None),
            Err(StingerError::ScaleContext(_))
        ));
        assert_eq!(conv.allocations(), 0);
    }
}
