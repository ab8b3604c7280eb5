// crates/stinger-core/src/host.rs
//
// Interfaces the compositing host provides to a stinger instance.
//
// GPU calls are only valid while the host's graphics context is entered.
// Every texture, image and effect call in this crate goes through a
// `GraphicsScope`, which enters on construction and leaves on drop, so an
// early return can never leak the context.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::media_types::NormalizedFrame;

/// Opaque host texture handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Opaque host shader-effect handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectId(pub u64);

pub trait GraphicsHost {
    fn enter_graphics(&mut self);
    fn leave_graphics(&mut self);

    fn load_effect(&mut self, path: &Path) -> Option<EffectId>;
    fn destroy_effect(&mut self, effect: EffectId);

    fn create_texture(&mut self, frame: &NormalizedFrame) -> Option<TextureId>;
    /// Unknown ids must be ignored.
    fn destroy_texture(&mut self, texture: TextureId);

    fn load_image(&mut self, path: &Path) -> Option<TextureId>;
    /// Unknown ids must be ignored.
    fn free_image(&mut self, image: TextureId);

    /// Draw `background` with `overlay` composited on top, filling `cx`×`cy`.
    /// Called from the render callback, where the context is already current.
    fn draw_stinger(
        &mut self,
        effect:     EffectId,
        background: TextureId,
        overlay:    Option<TextureId>,
        cx:         u32,
        cy:         u32,
    );
}

/// Scoped graphics-context acquisition.
pub struct GraphicsScope<'a, G: GraphicsHost + ?Sized> {
    host: &'a mut G,
}

impl<'a, G: GraphicsHost + ?Sized> GraphicsScope<'a, G> {
    pub fn enter(host: &'a mut G) -> Self {
        host.enter_graphics();
        Self { host }
    }
}

impl<G: GraphicsHost + ?Sized> Deref for GraphicsScope<'_, G> {
    type Target = G;
    fn deref(&self) -> &G { self.host }
}

impl<G: GraphicsHost + ?Sized> DerefMut for GraphicsScope<'_, G> {
    fn deref_mut(&mut self) -> &mut G { self.host }
}

impl<G: GraphicsHost + ?Sized> Drop for GraphicsScope<'_, G> {
    fn drop(&mut self) {
        self.host.leave_graphics();
    }
}

pub trait TransitionHost {
    /// Fix the transition length so progress spans one full stinger playback.
    fn enable_fixed_duration(&mut self, duration_ms: u32);
}

/// Per-sample gain curve, `t` in [0, 1].
pub type MixFn = fn(f32) -> f32;

pub trait AudioHost {
    /// Mix the two underlying sources into the output buffers using the gain
    /// curves. Returns whether audio was produced.
    fn transition_audio_render(
        &mut self,
        ts_out:      &mut u64,
        mixers:      u32,
        channels:    usize,
        sample_rate: usize,
        mix_a:       MixFn,
        mix_b:       MixFn,
    ) -> bool;
}
