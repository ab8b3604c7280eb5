// crates/stinger-core/src/testing.rs
//
// Scripted host and media backend for the state-machine tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::backend::{FrameDecoder, MediaBackend, MediaProber, OpenOptions};
use crate::error::{Result, StingerError};
use crate::host::{AudioHost, EffectId, GraphicsHost, MixFn, TextureId, TransitionHost};
use crate::media_types::{DecodeStep, FrameRate, NormalizedFrame, ProbeReport};

// ── Host ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resource {
    Texture,
    Image,
}

#[derive(Default)]
pub struct FakeHost {
    pub depth:            i32,
    /// GPU calls made outside a graphics scope.
    pub scope_violations: u32,
    pub fail_textures:    bool,
    pub missing_images:   bool,
    pub missing_effect:   bool,
    pub durations:        Vec<u32>,
    /// `(background, overlay)` of every draw.
    pub draws:            Vec<(TextureId, Option<TextureId>)>,
    pub effects_alive:    u32,
    pub uploads:          Vec<NormalizedFrame>,
    pub audio_weights:    Vec<(f32, f32)>,
    pub(crate) resources:            BTreeMap<u64, Resource>,
    pub(crate) next_id:              u64,
}

impl FakeHost {
    fn check_scope(&mut self) {
        if self.depth <= 0 {
            self.scope_violations += 1;
        }
    }

    fn alloc(&mut self, kind: Resource) -> TextureId {
        self.next_id += 1;
        self.resources.insert(self.next_id, kind);
        TextureId(self.next_id)
    }

    fn live(&self, kind: Resource) -> Vec<TextureId> {
        self.resources.iter().filter(|(_, k)| **k == kind).map(|(id, _)| TextureId(*id)).collect()
    }

    pub fn live_textures(&self) -> Vec<TextureId> {
        self.live(Resource::Texture)
    }

    pub fn live_images(&self) -> Vec<TextureId> {
        self.live(Resource::Image)
    }
}

impl GraphicsHost for FakeHost {
    fn enter_graphics(&mut self) { self.depth += 1; }
    fn leave_graphics(&mut self) { self.depth -= 1; }

    fn load_effect(&mut self, _path: &Path) -> Option<EffectId> {
        self.check_scope();
        if self.missing_effect { return None; }
        self.effects_alive += 1;
        Some(EffectId(7))
    }

    fn destroy_effect(&mut self, _effect: EffectId) {
        self.check_scope();
        self.effects_alive -= 1;
    }

    fn create_texture(&mut self, frame: &NormalizedFrame) -> Option<TextureId> {
        self.check_scope();
        if self.fail_textures { return None; }
        self.uploads.push(frame.clone());
        Some(self.alloc(Resource::Texture))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.check_scope();
        if self.resources.get(&texture.0) == Some(&Resource::Texture) {
            self.resources.remove(&texture.0);
        }
    }

    fn load_image(&mut self, _path: &Path) -> Option<TextureId> {
        self.check_scope();
        if self.missing_images { return None; }
        Some(self.alloc(Resource::Image))
    }

    fn free_image(&mut self, image: TextureId) {
        self.check_scope();
        if self.resources.get(&image.0) == Some(&Resource::Image) {
            self.resources.remove(&image.0);
        }
    }

    fn draw_stinger(
        &mut self,
        _effect:    EffectId,
        background: TextureId,
        overlay:    Option<TextureId>,
        _cx:        u32,
        _cy:        u32,
    ) {
        self.draws.push((background, overlay));
    }
}

impl TransitionHost for FakeHost {
    fn enable_fixed_duration(&mut self, duration_ms: u32) {
        self.durations.push(duration_ms);
    }
}

impl AudioHost for FakeHost {
    fn transition_audio_render(
        &mut self,
        _ts_out:      &mut u64,
        _mixers:      u32,
        _channels:    usize,
        _sample_rate: usize,
        mix_a:        MixFn,
        mix_b:        MixFn,
    ) -> bool {
        self.audio_weights.push((mix_a(0.25), mix_b(0.25)));
        true
    }
}

// ── Media backend ─────────────────────────────────────────────────────────────

/// What the fake backend does for one path.
#[derive(Clone, Debug)]
pub struct Script {
    pub frames:         u64,
    pub rate:           Option<FrameRate>,
    pub probe_err:      Option<StingerError>,
    pub open_err:       Option<StingerError>,
    /// Decode calls (1-based) that fail transiently.
    pub fail_at:        Vec<u64>,
    /// Decode calls (1-based) with no frame ready yet.
    pub pending_at:     Vec<u64>,
    /// No decode call ever has a frame ready.
    pub always_pending: bool,
}

impl Script {
    pub fn frames(frames: u64) -> Self {
        Self {
            frames,
            rate:           FrameRate::new(25, 1),
            probe_err:      None,
            open_err:       None,
            fail_at:        Vec::new(),
            pending_at:     Vec::new(),
            always_pending: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Probe(PathBuf),
    Open(PathBuf, OpenOptions),
    Restart,
    Decode,
    Dropped,
}

#[derive(Default)]
pub struct FakeBackend {
    pub scripts: HashMap<PathBuf, Script>,
    pub events:  Rc<RefCell<Vec<Event>>>,
}

impl FakeBackend {
    pub fn with(path: &str, script: Script) -> Self {
        let mut backend = Self::default();
        backend.scripts.insert(PathBuf::from(path), script);
        backend
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events.borrow().iter().filter(|e| *e == wanted).count()
    }
}

impl MediaProber for FakeBackend {
    fn probe(&self, path: &Path) -> Result<ProbeReport> {
        self.events.borrow_mut().push(Event::Probe(path.to_path_buf()));
        let script = self.scripts.get(path).ok_or_else(|| StingerError::Open {
            path:   path.to_path_buf(),
            reason: "No such file or directory".into(),
        })?;
        if let Some(e) = &script.probe_err {
            return Err(e.clone());
        }
        Ok(ProbeReport {
            path:        path.to_path_buf(),
            frame_count: script.frames,
            frame_rate:  script.rate,
            width:       2,
            height:      2,
            codec:       "fake".into(),
        })
    }
}

impl MediaBackend for FakeBackend {
    type Session = FakeSession;

    fn open(&self, path: &Path, options: OpenOptions) -> Result<FakeSession> {
        self.events.borrow_mut().push(Event::Open(path.to_path_buf(), options));
        let script = self.scripts.get(path).cloned().ok_or_else(|| StingerError::Open {
            path:   path.to_path_buf(),
            reason: "No such file or directory".into(),
        })?;
        if let Some(e) = script.open_err.clone() {
            return Err(e);
        }
        Ok(FakeSession { script, next: 0, calls: 0, events: Rc::clone(&self.events) })
    }
}

pub struct FakeSession {
    script: Script,
    next:   u64,
    calls:  u64,
    events: Rc<RefCell<Vec<Event>>>,
}

impl FrameDecoder for FakeSession {
    fn decode_next(&mut self) -> Result<DecodeStep> {
        self.events.borrow_mut().push(Event::Decode);
        self.calls += 1;
        if self.script.fail_at.contains(&self.calls) {
            return Err(StingerError::Decode("scripted failure".into()));
        }
        if self.script.always_pending || self.script.pending_at.contains(&self.calls) {
            return Ok(DecodeStep::Pending);
        }
        if self.next >= self.script.frames {
            return Ok(DecodeStep::EndOfStream);
        }
        let index = self.next;
        self.next += 1;
        // Every pixel carries the frame index so tests can tell frames apart.
        Ok(DecodeStep::Frame(NormalizedFrame::bgra(2, 2, vec![index as u8; 16])))
    }

    fn restart(&mut self) -> Result<()> {
        self.events.borrow_mut().push(Event::Restart);
        self.next = 0;
        Ok(())
    }

    fn frame_rate(&self) -> Option<FrameRate> {
        self.script.rate
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.events.borrow_mut().push(Event::Dropped);
    }
}
