// crates/stinger-core/src/progress.rs
//
// New-transition detection.
//
// The host restarts its progress clock for every scene switch, so a tick
// whose `t` is lower than the previous tick's means a new transition began.
// There is no debounce: jittery progress from the host restarts playback.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressTracker {
    last: f32,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Starts at 0.0: a freshly configured session is already at frame 0.
    pub fn new() -> Self {
        Self { last: 0.0 }
    }

    pub fn last(&self) -> f32 {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0.0;
    }

    /// Record `t` and report whether it regressed. Non-finite values are ignored.
    pub fn observe(&mut self, t: f32) -> bool {
        if !t.is_finite() {
            return false;
        }
        let restarted = t < self.last;
        self.last = t;
        restarted
    }
}
