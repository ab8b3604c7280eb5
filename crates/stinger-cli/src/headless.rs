// crates/stinger-cli/src/headless.rs
//
// HeadlessHost: a CPU-only implementation of the host interfaces, so the
// transition can be driven from the command line and in tests.
//
// Textures are BGRA buffers in a map keyed by id. The "effect" is the
// software compositor in compose.rs; every draw replaces `canvas`.
// Audio mixes two synthetic tones with the transition's gain curves.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use stinger_core::audio;
use stinger_core::host::{AudioHost, EffectId, GraphicsHost, MixFn, TextureId, TransitionHost};
use stinger_core::media_types::NormalizedFrame;

use crate::compose::{composite, CpuTexture};
use crate::yuv::frame_to_bgra;

const SOFTWARE_EFFECT: EffectId = EffectId(1);

#[derive(Default)]
pub struct HeadlessHost {
    textures:             HashMap<TextureId, CpuTexture>,
    next_id:              u64,
    depth:                u32,
    /// GPU calls made while no graphics scope was entered.
    pub scope_violations: u32,
    pub duration_ms:      Option<u32>,
    pub canvas:           Option<CpuTexture>,
    /// Progress the next `transition_audio_render` mixes at.
    pub audio_progress:   f32,
    pub last_audio:       Vec<f32>,
    pub last_gains:       (f32, f32),
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, texture: CpuTexture) -> TextureId {
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(id, texture);
        id
    }

    fn check_scope(&mut self, call: &str) {
        if self.depth == 0 {
            self.scope_violations += 1;
            warn!("[headless] {call} outside a graphics scope");
        }
    }

    /// A solid-colour scene texture. Scenes are owned by the caller, not a
    /// stinger instance, so this needs no graphics scope.
    pub fn solid_scene(&mut self, width: u32, height: u32, bgra: [u8; 4]) -> TextureId {
        self.insert(CpuTexture::solid(width, height, bgra))
    }

    #[cfg(test)]
    pub fn texture(&self, id: TextureId) -> Option<&CpuTexture> {
        self.textures.get(&id)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }
}

/// Load a PNG as BGRA.
pub fn load_png(path: &Path) -> Result<CpuTexture> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size().context("PNG too large")?];
    let info = reader.next_frame(&mut buf)?;
    let pixels = &buf[..info.buffer_size()];

    let bgra: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => pixels.chunks_exact(4).flat_map(|p| [p[2], p[1], p[0], p[3]]).collect(),
        png::ColorType::Rgb  => pixels.chunks_exact(3).flat_map(|p| [p[2], p[1], p[0], 255]).collect(),
        png::ColorType::GrayscaleAlpha => pixels.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect(),
        png::ColorType::Grayscale => pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => bail!("unsupported PNG colour type {other:?}"),
    };
    Ok(CpuTexture { width: info.width, height: info.height, bgra })
}

/// Stand-in when the placeholder PNG is not installed: magenta/black checkers.
fn generated_placeholder() -> CpuTexture {
    let (w, h) = (64u32, 36u32);
    let bgra = (0..w * h)
        .flat_map(|i| {
            let (x, y) = (i % w, i / w);
            if (x / 8 + y / 8) % 2 == 0 { [255, 0, 255, 255] } else { [0, 0, 0, 255] }
        })
        .collect();
    CpuTexture { width: w, height: h, bgra }
}

impl GraphicsHost for HeadlessHost {
    fn enter_graphics(&mut self) { self.depth += 1; }
    fn leave_graphics(&mut self) { self.depth = self.depth.saturating_sub(1); }

    fn load_effect(&mut self, path: &Path) -> Option<EffectId> {
        self.check_scope("load_effect");
        debug!("[headless] software compositor stands in for {}", path.display());
        Some(SOFTWARE_EFFECT)
    }

    fn destroy_effect(&mut self, _effect: EffectId) {
        self.check_scope("destroy_effect");
    }

    fn create_texture(&mut self, frame: &NormalizedFrame) -> Option<TextureId> {
        self.check_scope("create_texture");
        if !frame.is_complete() {
            return None;
        }
        let bgra = frame_to_bgra(frame);
        Some(self.insert(CpuTexture { width: frame.width, height: frame.height, bgra }))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.check_scope("destroy_texture");
        self.textures.remove(&texture);
    }

    fn load_image(&mut self, path: &Path) -> Option<TextureId> {
        self.check_scope("load_image");
        let image = load_png(path).unwrap_or_else(|e| {
            warn!("[headless] {e:#}, using a generated placeholder");
            generated_placeholder()
        });
        Some(self.insert(image))
    }

    fn free_image(&mut self, image: TextureId) {
        self.check_scope("free_image");
        self.textures.remove(&image);
    }

    fn draw_stinger(
        &mut self,
        _effect:    EffectId,
        background: TextureId,
        overlay:    Option<TextureId>,
        cx:         u32,
        cy:         u32,
    ) {
        let bg = self.textures.get(&background);
        let fg = overlay.and_then(|id| self.textures.get(&id));
        self.canvas = Some(composite(bg, fg, cx, cy));
    }
}

impl TransitionHost for HeadlessHost {
    fn enable_fixed_duration(&mut self, duration_ms: u32) {
        self.duration_ms = Some(duration_ms);
    }
}

impl AudioHost for HeadlessHost {
    fn transition_audio_render(
        &mut self,
        ts_out:      &mut u64,
        _mixers:     u32,
        _channels:   usize,
        sample_rate: usize,
        mix_a:       MixFn,
        mix_b:       MixFn,
    ) -> bool {
        // One 10 ms block of two constant-level sources.
        let n = (sample_rate / 100).max(1);
        let a = vec![0.5f32; n];
        let b = vec![-0.5f32; n];
        self.last_audio = vec![0.0; n];
        let t = self.audio_progress.clamp(0.0, 1.0);
        audio::mix_buffers(&a, &b, &mut self.last_audio, t, t);
        self.last_gains = (mix_a(t), mix_b(t));
        *ts_out += (n as u64 * 1_000_000_000) / sample_rate.max(1) as u64;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stinger_core::host::GraphicsScope;

    #[test]
    fn textures_are_scoped_and_released() {
        let mut host = HeadlessHost::new();
        let frame = NormalizedFrame::bgra(2, 1, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        let id = {
            let mut gfx = GraphicsScope::enter(&mut host);
            gfx.create_texture(&frame).unwrap()
        };
        assert_eq!(host.texture(id).unwrap().bgra, frame.planes[0].data);
        {
            let mut gfx = GraphicsScope::enter(&mut host);
            gfx.destroy_texture(id);
            gfx.destroy_texture(id); // unknown ids are ignored
        }
        assert_eq!(host.live_textures(), 0);
        assert_eq!(host.scope_violations, 0);
    }

    #[test]
    fn missing_placeholder_is_generated() {
        let mut host = HeadlessHost::new();
        host.enter_graphics();
        let id = host.load_image(Path::new("/nonexistent/NoStingerVideoLoaded.png")).unwrap();
        host.leave_graphics();
        assert_eq!(host.texture(id).unwrap().width, 64);
    }

    #[test]
    fn png_placeholder_round_trips_through_loader() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        {
            let file = File::create(&path).unwrap();
            let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), 2, 1);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[255, 0, 0, 255, 0, 0, 255, 128]).unwrap();
        }
        let tex = load_png(&path).unwrap();
        assert_eq!(tex.bgra, vec![0, 0, 255, 255, 255, 0, 0, 128]);
    }

    #[test]
    fn audio_follows_progress() {
        let mut host = HeadlessHost::new();
        host.audio_progress = 0.25;
        let mut ts = 0;
        assert!(host.transition_audio_render(&mut ts, 1, 2, 48_000, audio::mix_a, audio::mix_b));
        assert_eq!(host.last_gains, (0.75, 0.25));
        assert_eq!(ts, 10_000_000);
        assert!((host.last_audio[0] - 0.25).abs() < 1e-6);
    }
}
