//! Canonical snippet data model.
//!
//! `SnippetData` is the authored, serializable half of a snippet (what is persisted
//! and exchanged as JSON). Runtime playback state lives in `registry::Snippet`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SnippetError;

/// Channel identifier: a numeric Action Unit id ("12") or a viseme/morph name ("Ah").
pub type ChannelId = String;

/// A single keyframe in snippet-local seconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub intensity: f32,
    /// Take the channel's live value instead of the authored intensity.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inherit: bool,
}

impl Keyframe {
    pub fn new(time: f32, intensity: f32) -> Self {
        Self {
            time,
            intensity,
            inherit: false,
        }
    }

    pub fn inherited(time: f32, intensity: f32) -> Self {
        Self {
            time,
            intensity,
            inherit: true,
        }
    }
}

/// Keyframes of one channel, kept in ascending `time` order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Curve {
    pub keyframes: Vec<Keyframe>,
}

impl Curve {
    /// Build a curve, sorting keyframes by time (stable for equal stamps).
    pub fn new(mut keyframes: Vec<Keyframe>) -> Self {
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keyframes }
    }

    pub fn from_pairs(pairs: &[(f32, f32)]) -> Self {
        Self::new(pairs.iter().map(|&(t, v)| Keyframe::new(t, v)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn first(&self) -> Option<&Keyframe> {
        self.keyframes.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut Keyframe> {
        self.keyframes.first_mut()
    }

    /// Time of the last keyframe (0 when empty).
    pub fn end_time(&self) -> f32 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Time of the first keyframe strictly after `t`, if any.
    pub fn next_time_after(&self, t: f32) -> Option<f32> {
        let idx = self.keyframes.partition_point(|k| k.time <= t);
        self.keyframes.get(idx).map(|k| k.time)
    }

    /// Non-decreasing time stamps.
    pub fn is_sorted(&self) -> bool {
        self.keyframes.windows(2).all(|w| w[0].time <= w[1].time)
    }
}

/// How a snippet's samples combine with other snippets on the same channel.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Highest priority wins; equal priorities keep the larger value.
    #[default]
    Replace,
    /// Summed on top of the replace winner.
    Additive,
}

fn default_rate() -> f32 {
    1.0
}

fn default_scale() -> f32 {
    1.0
}

fn default_category() -> String {
    "default".to_string()
}

/// Authored snippet in its canonical (wire) form.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SnippetData {
    pub name: String,
    #[serde(rename = "loop", default)]
    pub looping: bool,
    #[serde(rename = "snippetPriority", default)]
    pub priority: i32,
    #[serde(rename = "snippetPlaybackRate", default = "default_rate")]
    pub playback_rate: f32,
    #[serde(rename = "snippetIntensityScale", default = "default_scale")]
    pub intensity_scale: f32,
    #[serde(rename = "snippetBlendMode", default)]
    pub blend_mode: BlendMode,
    #[serde(rename = "snippetCategory", default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub curves: IndexMap<ChannelId, Curve>,
}

impl SnippetData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            looping: false,
            priority: 0,
            playback_rate: 1.0,
            intensity_scale: 1.0,
            blend_mode: BlendMode::Replace,
            category: default_category(),
            curves: IndexMap::new(),
        }
    }

    pub fn with_curve(mut self, channel: impl Into<ChannelId>, curve: Curve) -> Self {
        self.curves.insert(channel.into(), curve);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_playback_rate(mut self, rate: f32) -> Self {
        self.playback_rate = coerce_playback_rate(rate);
        self
    }

    pub fn with_intensity_scale(mut self, scale: f32) -> Self {
        self.intensity_scale = coerce_intensity_scale(scale);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Latest keyframe time across all curves (0 if there are none).
    pub fn duration(&self) -> f32 {
        self.curves
            .values()
            .map(Curve::end_time)
            .fold(0.0f32, f32::max)
    }

    /// Serialize into the persisted wire schema.
    pub fn to_json(&self) -> Result<serde_json::Value, SnippetError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse strictly from the canonical wire schema. Legacy shapes go through
    /// `normalize::normalize_snippet`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, SnippetError> {
        let mut data: SnippetData = serde_json::from_value(value)?;
        data.playback_rate = coerce_playback_rate(data.playback_rate);
        data.intensity_scale = coerce_intensity_scale(data.intensity_scale);
        for curve in data.curves.values_mut() {
            if !curve.is_sorted() {
                *curve = Curve::new(std::mem::take(&mut curve.keyframes));
            }
        }
        Ok(data)
    }
}

/// Rates must be finite and positive; anything else plays at 1x.
pub fn coerce_playback_rate(rate: f32) -> f32 {
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        1.0
    }
}

/// Scales must be finite and non-negative; anything else silences the snippet.
pub fn coerce_intensity_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.max(0.0)
    } else {
        0.0
    }
}
