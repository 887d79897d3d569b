//! Target resolution: merge per-snippet channel samples into one value per channel.
//!
//! Replace-mode contributions compete: higher priority wins, equal priority keeps
//! the larger value (most expressive wins, not first write). Additive contributions
//! are summed separately and stacked on the replace winner at finalize.

use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::data::{BlendMode, ChannelId};

#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Quadratic intensity scaling: 0.5 -> 0.25x, 1.0 -> 1x, 2.0 -> 4x. Clamped to [0, 1].
#[inline]
pub fn apply_intensity_scale(raw: f32, scale: f32) -> f32 {
    clamp01(raw * scale * scale)
}

/// Resolved value for one channel this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub value: f32,
    pub priority: i32,
    /// Suggested host transition time towards `value`.
    pub duration_ms: f32,
    /// Category of the winning replace-mode snippet ("default" for additive-only).
    pub category: String,
}

/// One sampled, scaled channel value from one snippet.
#[derive(Clone, Copy, Debug)]
pub struct Contribution<'a> {
    pub snippet: &'a str,
    pub value: f32,
    pub priority: i32,
    pub blend_mode: BlendMode,
    pub duration_ms: f32,
    pub category: &'a str,
}

#[derive(Clone, Copy, Debug, Default)]
struct AdditiveSum {
    sum: f32,
    max_priority: i32,
}

/// Accumulates contributions across snippets for one tick.
#[derive(Debug, Default)]
pub struct Resolver {
    replace: IndexMap<ChannelId, Target>,
    additive: IndexMap<ChannelId, AdditiveSum>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: &str, c: Contribution<'_>) {
        match c.blend_mode {
            BlendMode::Additive => {
                let entry = self.additive.entry(channel.to_string()).or_default();
                entry.sum += c.value;
                entry.max_priority = entry.max_priority.max(c.priority);
            }
            BlendMode::Replace => match self.replace.get_mut(channel) {
                None => {
                    self.replace.insert(
                        channel.to_string(),
                        Target {
                            value: c.value,
                            priority: c.priority,
                            duration_ms: c.duration_ms,
                            category: c.category.to_string(),
                        },
                    );
                }
                Some(prev) => {
                    let wins = c.priority > prev.priority
                        || (c.priority == prev.priority && c.value > prev.value);
                    trace!(
                        "conflict on {}: {} (pri {}, {:.3}) vs current (pri {}, {:.3}) -> {}",
                        channel,
                        c.snippet,
                        c.priority,
                        c.value,
                        prev.priority,
                        prev.value,
                        if wins { "wins" } else { "loses" }
                    );
                    if wins {
                        prev.value = c.value;
                        prev.priority = c.priority;
                        prev.duration_ms = c.duration_ms;
                        prev.category.clear();
                        prev.category.push_str(c.category);
                    }
                }
            },
        }
    }

    /// Combine replace winners with additive sums. Channels fed only by additive
    /// snippets use the sum alone with `additive_tween_ms`.
    pub fn finalize(self, additive_tween_ms: f32) -> IndexMap<ChannelId, Target> {
        let mut out = self.replace;
        for (channel, add) in self.additive {
            match out.get_mut(&channel) {
                Some(target) => {
                    let combined = clamp01(target.value + add.sum);
                    trace!(
                        "additive on {}: replace={:.3} additive={:.3} -> {:.3}",
                        channel,
                        target.value,
                        add.sum,
                        combined
                    );
                    target.value = combined;
                }
                None => {
                    let combined = clamp01(add.sum);
                    trace!(
                        "additive on {}: additive only={:.3} -> {:.3}",
                        channel,
                        add.sum,
                        combined
                    );
                    out.insert(
                        channel,
                        Target {
                            value: combined,
                            priority: add.max_priority.max(0),
                            duration_ms: additive_tween_ms,
                            category: "default".to_string(),
                        },
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(value: f32, priority: i32, blend_mode: BlendMode) -> Contribution<'static> {
        Contribution {
            snippet: "t",
            value,
            priority,
            blend_mode,
            duration_ms: 100.0,
            category: "default",
        }
    }

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-6, "left={a} right={b}");
    }

    #[test]
    fn priority_beats_value() {
        let mut r = Resolver::new();
        r.add("1", c(0.8, 1, BlendMode::Replace));
        r.add("1", c(0.3, 10, BlendMode::Replace));
        approx(r.finalize(120.0)["1"].value, 0.3);
    }

    #[test]
    fn equal_priority_keeps_larger_value_regardless_of_order() {
        for order in [[0.3, 0.8], [0.8, 0.3]] {
            let mut r = Resolver::new();
            for v in order {
                r.add("1", c(v, 5, BlendMode::Replace));
            }
            approx(r.finalize(120.0)["1"].value, 0.8);
        }
    }

    #[test]
    fn additive_stacks_and_clamps() {
        let mut r = Resolver::new();
        r.add("1", c(0.3, 0, BlendMode::Additive));
        r.add("1", c(0.4, 2, BlendMode::Additive));
        let out = r.finalize(120.0);
        approx(out["1"].value, 0.7);
        assert_eq!(out["1"].priority, 2);
        assert_eq!(out["1"].duration_ms, 120.0);

        let mut r = Resolver::new();
        r.add("1", c(0.3, 0, BlendMode::Additive));
        r.add("1", c(0.4, 0, BlendMode::Additive));
        r.add("1", c(0.2, 0, BlendMode::Replace));
        approx(r.finalize(120.0)["1"].value, 0.9);

        let mut r = Resolver::new();
        r.add("1", c(0.7, 0, BlendMode::Additive));
        r.add("1", c(0.6, 0, BlendMode::Replace));
        approx(r.finalize(120.0)["1"].value, 1.0);
    }

    #[test]
    fn quadratic_scale() {
        approx(apply_intensity_scale(1.0, 0.5), 0.25);
        approx(apply_intensity_scale(0.2, 2.0), 0.8);
        approx(apply_intensity_scale(0.5, 2.0), 1.0);
        approx(apply_intensity_scale(-0.3, 1.0), 0.0);
    }
}
