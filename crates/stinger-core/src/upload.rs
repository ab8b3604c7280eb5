// crates/stinger-core/src/upload.rs
//
// Texture upload bridge: the one texture a stinger instance shows.
//
// The slot holds either a decode-backed texture or the placeholder image,
// never both. Replacing it always releases the previous handle the way it
// was created (texture vs image).

use std::path::Path;
use tracing::{error, warn};

use crate::error::{Result, StingerError};
use crate::host::{GraphicsHost, GraphicsScope, TextureId};
use crate::media_types::NormalizedFrame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveTexture {
    Decoded(TextureId),
    Placeholder(TextureId),
}

impl ActiveTexture {
    pub fn id(self) -> TextureId {
        match self {
            ActiveTexture::Decoded(id) | ActiveTexture::Placeholder(id) => id,
        }
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, ActiveTexture::Placeholder(_))
    }
}

#[derive(Debug, Default)]
pub struct TextureSlot {
    active: Option<ActiveTexture>,
}

impl TextureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ActiveTexture> {
        self.active
    }

    /// Upload `frame` as the new decode-backed texture.
    ///
    /// `None` (no frame data, e.g. invalid media) leaves the slot untouched.
    /// On host failure the previous texture stays active.
    pub fn upload<G: GraphicsHost + ?Sized>(
        &mut self,
        host:  &mut G,
        frame: Option<&NormalizedFrame>,
    ) -> Result<Option<TextureId>> {
        let Some(frame) = frame else { return Ok(None) };
        if !frame.is_complete() {
            return Err(StingerError::Allocation(format!(
                "{}x{} {:?} frame is missing plane data",
                frame.width, frame.height, frame.format,
            )));
        }

        let mut gfx = GraphicsScope::enter(host);
        let created = gfx.create_texture(frame).ok_or_else(|| {
            StingerError::Allocation(format!(
                "texture {}x{} {:?}", frame.width, frame.height, frame.format,
            ))
        })?;
        if let Some(previous) = self.active.replace(ActiveTexture::Decoded(created)) {
            release(&mut *gfx, previous);
        }
        Ok(Some(created))
    }

    /// Swap in the placeholder image from `path`.
    ///
    /// Returns false when the host could not load it; the slot is then empty.
    pub fn show_placeholder<G: GraphicsHost + ?Sized>(&mut self, host: &mut G, path: &Path) -> bool {
        let mut gfx = GraphicsScope::enter(host);
        if let Some(previous) = self.active.take() {
            release(&mut *gfx, previous);
        }
        match gfx.load_image(path) {
            Some(id) => {
                self.active = Some(ActiveTexture::Placeholder(id));
                true
            }
            None => {
                error!("[stinger] placeholder image {} could not be loaded", path.display());
                false
            }
        }
    }

    /// Release the placeholder if it is the active texture.
    pub fn drop_placeholder<G: GraphicsHost + ?Sized>(&mut self, host: &mut G) {
        if let Some(active @ ActiveTexture::Placeholder(_)) = self.active {
            let mut gfx = GraphicsScope::enter(host);
            release(&mut *gfx, active);
            self.active = None;
        }
    }

    /// Release whatever is active. Safe on an empty slot.
    pub fn release_all<G: GraphicsHost + ?Sized>(&mut self, host: &mut G) {
        if let Some(active) = self.active.take() {
            let mut gfx = GraphicsScope::enter(host);
            release(&mut *gfx, active);
        }
    }
}

impl Drop for TextureSlot {
    fn drop(&mut self) {
        if let Some(active) = self.active {
            warn!("[stinger] texture {:?} dropped without release_all", active);
        }
    }
}

fn release<G: GraphicsHost + ?Sized>(gfx: &mut G, texture: ActiveTexture) {
    match texture {
        ActiveTexture::Decoded(id)     => gfx.destroy_texture(id),
        ActiveTexture::Placeholder(id) => gfx.free_image(id),
    }
}
