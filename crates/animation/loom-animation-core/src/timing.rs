//! Time engine: maps the global play clock onto each snippet's local curve time.
//!
//! A snippet never stores its local time as the source of truth. It stores an
//! anchor `(starts_at, offset)`: at play time `starts_at` its local clock reads
//! `offset`. Seeks and rate changes only rewrite the anchor, so the local time at
//! any later play time follows from one formula and never needs history replay.

use serde::{Deserialize, Serialize};

/// Play-clock anchor of one snippet.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Global play time (s) at which the local clock reads `offset`.
    pub starts_at: f32,
    /// Local time (s) at `starts_at`.
    pub offset: f32,
}

impl Anchor {
    pub fn new(starts_at: f32, offset: f32) -> Self {
        Self { starts_at, offset }
    }

    /// Anchor that reads `local` right now.
    pub fn at(t_play: f32, local: f32) -> Self {
        Self {
            starts_at: t_play,
            offset: local,
        }
    }
}

/// Resolved local time of a snippet at one play time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalTime {
    /// Unwrapped, unclamped local time.
    pub raw: f32,
    /// Curve time actually sampled: wrapped into [0, duration) when looping,
    /// clamped into [0, duration] otherwise.
    pub local: f32,
    /// Completed loop iterations (always 0 for non-looping snippets).
    pub loop_count: i64,
    pub duration: f32,
}

impl LocalTime {
    /// A non-looping snippet has reached (or passed) its end.
    pub fn finished(&self, looping: bool) -> bool {
        !looping && self.duration > 0.0 && self.raw >= self.duration
    }
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Compute local time under an anchor. Returns `None` while the snippet has not
/// started yet (`t_play < starts_at`).
pub fn local_time(
    anchor: Anchor,
    rate: f32,
    duration: f32,
    looping: bool,
    t_play: f32,
) -> Option<LocalTime> {
    let elapsed = t_play - anchor.starts_at;
    if elapsed < 0.0 {
        return None;
    }
    let raw = anchor.offset + elapsed * rate;
    let (local, loop_count) = if looping && duration > 0.0 {
        let wrapped = fmod(raw, duration);
        // Float remainder can land exactly on `duration` for tiny negative inputs.
        let wrapped = if wrapped >= duration { 0.0 } else { wrapped };
        (wrapped, (raw / duration).floor() as i64)
    } else {
        (raw.clamp(0.0, duration.max(0.0)), 0)
    };
    Some(LocalTime {
        raw,
        local,
        loop_count,
        duration,
    })
}

/// Rebase an anchor for a new playback rate so that local time at `t_play` does
/// not jump. Snippets that have not started keep their anchor.
pub fn rebase_for_rate(anchor: Anchor, old_rate: f32, t_play: f32) -> Anchor {
    let elapsed = t_play - anchor.starts_at;
    if elapsed < 0.0 {
        return anchor;
    }
    Anchor::at(t_play, anchor.offset + elapsed * old_rate)
}
