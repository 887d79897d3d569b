//! Curve sampling in snippet-local seconds.
//!
//! Model:
//! - Keyframes are ordered by time; segments interpolate linearly.
//! - Outside the authored span the curve holds its edge value (no extrapolation),
//!   so small step overshoot at the clip edges never produces runaway values.

use crate::data::{Curve, Keyframe};

/// Minimum segment span used as the interpolation denominator.
const MIN_SEGMENT: f32 = 1e-6;

/// Find the segment [i, i+1] that contains t, and return (i, i+1, local_t),
/// where local_t is normalized to [0, 1] between keys[i].time .. keys[i+1].time.
/// Edge cases:
/// - If t <= first.time, returns (0, 0, 0) and caller should pick keys[0].
/// - If t >= last.time, returns (last, last, 0) and caller should pick keys[last].
fn find_segment(keys: &[Keyframe], t: f32) -> (usize, usize, f32) {
    let n = keys.len();
    if n == 0 || t <= keys[0].time {
        return (0, 0, 0.0);
    }
    if t >= keys[n - 1].time {
        return (n - 1, n - 1, 0.0);
    }
    // First key strictly after t; t > keys[0].time guarantees hi >= 1.
    let hi = keys.partition_point(|k| k.time <= t);
    let lo = hi - 1;
    let denom = (keys[hi].time - keys[lo].time).max(MIN_SEGMENT);
    let lt = (t - keys[lo].time) / denom;
    (lo, hi, lt.clamp(0.0, 1.0))
}

/// Sample a keyframe list at local time `t` (seconds). Empty lists sample to 0.
pub fn sample_keyframes(keys: &[Keyframe], t: f32) -> f32 {
    if keys.is_empty() {
        return 0.0;
    }
    let (i0, i1, lt) = find_segment(keys, t);
    if i0 == i1 {
        return keys[i0].intensity;
    }
    let a = keys[i0].intensity;
    let b = keys[i1].intensity;
    a + (b - a) * lt
}

/// Sample a curve at local time `t` (seconds).
#[inline]
pub fn sample_curve(curve: &Curve, t: f32) -> f32 {
    sample_keyframes(&curve.keyframes, t)
}
