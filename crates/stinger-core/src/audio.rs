// crates/stinger-core/src/audio.rs
//
// Audio of a stinger transition: a linear cross-fade of the two underlying
// scenes. The stinger clip's own audio track is not mixed in.

/// Gain of the outgoing scene.
pub fn mix_a(t: f32) -> f32 {
    1.0 - t
}

/// Gain of the incoming scene.
pub fn mix_b(t: f32) -> f32 {
    t
}

/// Cross-fade one planar channel for hosts without a mixer of their own.
///
/// `t` ramps linearly from `t_start` at the first sample to `t_end` after the
/// last. Only `min(a.len(), b.len(), out.len())` samples are written.
pub fn mix_buffers(a: &[f32], b: &[f32], out: &mut [f32], t_start: f32, t_end: f32) {
    let n = a.len().min(b.len()).min(out.len());
    if n == 0 {
        return;
    }
    let step = (t_end - t_start) / n as f32;
    for (i, dst) in out[..n].iter_mut().enumerate() {
        let t = (t_start + step * i as f32).clamp(0.0, 1.0);
        *dst = a[i] * mix_a(t) + b[i] * mix_b(t);
    }
}
