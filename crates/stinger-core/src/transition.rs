// crates/stinger-core/src/transition.rs
//
// The stinger transition instance and its per-tick state machine.
//
// Lifecycle (driven by the host):
//   create  → load the composite effect, then `update`
//   update  → validity check, open + prime a decode session or fall back
//             to the placeholder, report the fixed duration
//   render  → once per output frame with progress `t`
//   destroy → release decode state first, then GPU resources
//
// Per tick:
//   1. `t` lower than last tick's → new transition: rewind the session and
//      reset the frame counter.
//   2. Decode and upload exactly one frame unless the stream has ended or
//      the media is invalid. End of stream holds the last texture.
//   3. Background is scene A until the cut frame is on screen, then scene B.
//   4. One composite pass with the stinger texture on top.
//
// Decoding runs inline on the render callback unless the session was opened
// with `prefetch`, in which case a tick with no frame ready holds the
// current texture and does not advance the counter.

use std::path::Path;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio;
use crate::backend::{FrameDecoder, MediaBackend, OpenOptions};
use crate::error::{Result, StingerError};
use crate::helpers::time::fixed_duration_ms;
use crate::host::{AudioHost, EffectId, GraphicsHost, GraphicsScope, TextureId, TransitionHost};
use crate::media_types::DecodeStep;
use crate::progress::ProgressTracker;
use crate::settings::{StingerConfig, StingerSettings};
use crate::upload::{ActiveTexture, TextureSlot};
use crate::validity::{self, ValidityResult, INVALID_FRAME_SENTINEL};

/// How many `Pending` polls priming tolerates before giving up on a session.
const PRIME_POLL_LIMIT: u32 = 400;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Holding the last frame: stream ended or transition completed.
    Idle,
    /// A transition is running and frames are advancing.
    Playing,
    /// Media failed to configure; the placeholder is shown and decode is bypassed.
    Invalid,
}

/// Which input scene is drawn under the stinger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Background {
    A,
    B,
}

/// Scene A while `frame_index < cut_frame - 1`, scene B from the cut frame on.
///
/// `frame_index` is 0-based, `cut_frame` 1-based; `cut_frame = 1` shows B
/// from the first frame.
pub fn background_for(frame_index: u64, cut_frame: u64) -> Background {
    if frame_index < cut_frame.saturating_sub(1) {
        Background::A
    } else {
        Background::B
    }
}

/// What one render tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub restarted:   bool,
    /// A new stinger frame was uploaded this tick.
    pub advanced:    bool,
    pub frame_index: u64,
    pub background:  Background,
    pub state:       PlaybackState,
}

pub struct StingerTransition<B: MediaBackend> {
    id:               Uuid,
    backend:          B,
    config:           StingerConfig,
    effect:           EffectId,

    media_path:       String,
    options:          OpenOptions,
    valid:            bool,
    cut_frame:        u64,
    total_frames:     u64,
    duration_ms:      u32,

    session:          Option<B::Session>,
    texture:          TextureSlot,
    progress:         ProgressTracker,
    state:            PlaybackState,
    /// Frames uploaded since the last restart.
    frames_presented: u64,
    end_of_stream:    bool,
    restarts:         u64,
}

impl<B: MediaBackend> StingerTransition<B> {
    /// Load the composite effect and apply `settings`.
    ///
    /// Fails only when the effect cannot be loaded; bad media degrades to the
    /// placeholder instead.
    pub fn create<H>(
        settings: &mut StingerSettings,
        config:   StingerConfig,
        backend:  B,
        host:     &mut H,
    ) -> Result<Self>
    where
        H: GraphicsHost + TransitionHost + ?Sized,
    {
        let effect_path = config.effect_path();
        let effect = {
            let mut gfx = GraphicsScope::enter(host);
            gfx.load_effect(&effect_path)
        };
        let Some(effect) = effect else {
            error!("[stinger] could not find {}", effect_path.display());
            return Err(StingerError::EffectLoad(effect_path));
        };

        let mut stinger = Self {
            id: Uuid::new_v4(),
            backend,
            config,
            effect,
            media_path:       String::new(),
            options:          OpenOptions::default(),
            valid:            false,
            cut_frame:        INVALID_FRAME_SENTINEL,
            total_frames:     INVALID_FRAME_SENTINEL,
            duration_ms:      0,
            session:          None,
            texture:          TextureSlot::new(),
            progress:         ProgressTracker::new(),
            state:            PlaybackState::Invalid,
            frames_presented: 0,
            end_of_stream:    false,
            restarts:         0,
        };
        stinger.update(settings, host);
        Ok(stinger)
    }

    /// Reconfigure from `settings`, writing derived values back into them.
    pub fn update<H>(&mut self, settings: &mut StingerSettings, host: &mut H)
    where
        H: GraphicsHost + TransitionHost + ?Sized,
    {
        self.release_session();
        self.media_path       = settings.stinger_path.clone();
        self.options          = settings.open_options();
        self.frames_presented = 0;
        self.end_of_stream    = false;
        self.progress.reset();

        if let ValidityResult::Valid { report, cut_frame } =
            validity::assess(&self.backend, &self.media_path, settings.cut_frame)
        {
            self.texture.drop_placeholder(host);
            match self.open_and_prime(host) {
                Ok(session) => {
                    let rate = report.frame_rate
                        .or_else(|| session.frame_rate())
                        .unwrap_or(self.config.fallback_rate);
                    self.session      = Some(session);
                    self.valid        = true;
                    self.total_frames = report.frame_count;
                    self.cut_frame    = cut_frame;
                    self.duration_ms  = fixed_duration_ms(report.frame_count, rate);
                    self.state        = PlaybackState::Idle;

                    settings.number_of_frames = report.frame_count as i64;
                    settings.cut_frame        = cut_frame as i64;
                    host.enable_fixed_duration(self.duration_ms);

                    info!(
                        instance = %self.id,
                        path = %self.media_path,
                        frames = self.total_frames,
                        cut = self.cut_frame,
                        duration_ms = self.duration_ms,
                        "[stinger] stinger loaded"
                    );
                    return;
                }
                Err(e) => {
                    warn!(instance = %self.id, path = %self.media_path, "[stinger] {e}");
                }
            }
        }

        self.enter_invalid(settings, host);
    }

    /// One render tick. `a`/`b` are the outgoing/incoming scene textures.
    pub fn render<H: GraphicsHost + ?Sized>(
        &mut self,
        host: &mut H,
        a:    TextureId,
        b:    TextureId,
        t:    f32,
        cx:   u32,
        cy:   u32,
    ) -> TickReport {
        let restarted = self.progress.observe(t);
        if restarted {
            self.restart_playback(host);
        }

        let advanced = self.advance(host);
        if self.valid && t >= 1.0 {
            self.state = PlaybackState::Idle;
        }

        let frame_index = self.current_frame_index();
        let background  = background_for(frame_index, self.cut_frame);
        let scene = match background {
            Background::A => a,
            Background::B => b,
        };
        host.draw_stinger(self.effect, scene, self.texture.active().map(ActiveTexture::id), cx, cy);

        TickReport { restarted, advanced, frame_index, background, state: self.state }
    }

    /// Audio is a plain cross-fade of the two scenes.
    pub fn audio_render<H: AudioHost + ?Sized>(
        &self,
        host:        &mut H,
        ts_out:      &mut u64,
        mixers:      u32,
        channels:    usize,
        sample_rate: usize,
    ) -> bool {
        host.transition_audio_render(ts_out, mixers, channels, sample_rate, audio::mix_a, audio::mix_b)
    }

    /// Release everything the instance owns: decode state, then GPU resources.
    pub fn destroy<H: GraphicsHost + ?Sized>(mut self, host: &mut H) {
        self.release_session();
        self.texture.release_all(host);
        let mut gfx = GraphicsScope::enter(host);
        gfx.destroy_effect(self.effect);
        debug!(instance = %self.id, "[stinger] destroyed");
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid { self.id }
    pub fn is_valid(&self) -> bool { self.valid }
    pub fn cut_frame(&self) -> u64 { self.cut_frame }
    pub fn total_frames(&self) -> u64 { self.total_frames }
    pub fn duration_ms(&self) -> u32 { self.duration_ms }
    pub fn state(&self) -> PlaybackState { self.state }
    pub fn restarts(&self) -> u64 { self.restarts }
    pub fn options(&self) -> OpenOptions { self.options }
    pub fn active_texture(&self) -> Option<ActiveTexture> { self.texture.active() }
    pub fn has_session(&self) -> bool { self.session.is_some() }

    /// 0-based index of the stinger frame on screen.
    pub fn current_frame_index(&self) -> u64 {
        self.frames_presented.saturating_sub(1)
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Open a session, upload its first frame, and rewind it.
    ///
    /// Priming guarantees a decode-backed texture exists as soon as the
    /// media is accepted, and that the first transition starts at frame 0.
    fn open_and_prime<H: GraphicsHost + ?Sized>(&mut self, host: &mut H) -> Result<B::Session> {
        let mut session = self.backend.open(Path::new(&self.media_path), self.options)?;

        let mut polls = 0;
        let first = loop {
            match session.decode_next() {
                Ok(DecodeStep::Frame(frame)) => break frame,
                Ok(DecodeStep::EndOfStream) => {
                    return Err(StingerError::Decode("stream ended before the first frame".into()));
                }
                Ok(DecodeStep::Pending) => {}
                Err(e) if e.is_configuration_error() => return Err(e),
                Err(e) => debug!("[stinger] priming: {e}"),
            }
            polls += 1;
            if polls >= PRIME_POLL_LIMIT {
                return Err(StingerError::Decode("no frame decoded while priming".into()));
            }
        };

        self.texture.upload(host, Some(&first))?;
        session.restart()?;
        Ok(session)
    }

    fn enter_invalid<H>(&mut self, settings: &mut StingerSettings, host: &mut H)
    where
        H: GraphicsHost + TransitionHost + ?Sized,
    {
        self.release_session();
        self.valid            = false;
        self.cut_frame        = INVALID_FRAME_SENTINEL;
        self.total_frames     = INVALID_FRAME_SENTINEL;
        self.frames_presented = 0;
        self.end_of_stream    = false;
        self.state            = PlaybackState::Invalid;
        self.duration_ms = validity::enter_fallback(&mut self.texture, host, settings, &self.config);
        info!(instance = %self.id, path = %self.media_path, "[stinger] no stinger loaded, using placeholder");
    }

    fn restart_playback<H: GraphicsHost + ?Sized>(&mut self, host: &mut H) {
        self.restarts        += 1;
        self.frames_presented = 0;
        self.end_of_stream    = false;

        if !self.valid {
            if self.texture.active().is_none() {
                self.texture.show_placeholder(host, &self.config.placeholder_path());
            }
            return;
        }

        self.state = PlaybackState::Playing;
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.restart() {
                warn!(instance = %self.id, "[stinger] restart failed: {e}");
            }
        }
        debug!(instance = %self.id, "[stinger] new transition, stinger rewound");
    }

    fn advance<H: GraphicsHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if !self.valid || self.end_of_stream {
            return false;
        }
        let Some(session) = self.session.as_mut() else { return false };

        match session.decode_next() {
            Ok(DecodeStep::Frame(frame)) => match self.texture.upload(host, Some(&frame)) {
                Ok(_) => {
                    self.frames_presented += 1;
                    self.state = PlaybackState::Playing;
                    true
                }
                Err(e) => {
                    warn!(instance = %self.id, "[stinger] upload: {e}");
                    false
                }
            },
            Ok(DecodeStep::EndOfStream) => {
                debug!(instance = %self.id, frames = self.frames_presented, "[stinger] end of stinger, holding last frame");
                self.end_of_stream = true;
                self.state = PlaybackState::Idle;
                false
            }
            Ok(DecodeStep::Pending) => false,
            Err(e) => {
                warn!(instance = %self.id, "[stinger] decode: {e}");
                false
            }
        }
    }

    fn release_session(&mut self) {
        if self.session.take().is_some() {
            debug!(instance = %self.id, "[stinger] decode session closed");
        }
    }
}
