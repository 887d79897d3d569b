//! Snippet normalizer: turns authored snippet JSON into canonical `SnippetData`.
//!
//! Two authored shapes are accepted:
//! - curve maps: `{ "curves": { "12": [{ "time": 0, "intensity": 0.5, "inherit": true }] } }`
//!   (`t`/`v` accepted as short names)
//! - flat legacy arrays: `{ "au": [{ "id": 12, "t": 0, "v": 50 }], "viseme": [{ "key": "Ah", "t": 0, "v": 1 }] }`
//!
//! Notes:
//! - Intensities above 1 are percentages and are divided by 100; 1 itself is already
//!   normalized (100%), not 1%. Stored intensities are clamped to [0, 1].
//! - Keyframes are sorted ascending per channel; negative times clamp to 0.
//! - A missing name leaves `SnippetData::name` empty; the engine assigns one on load.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::data::{
    coerce_intensity_scale, coerce_playback_rate, BlendMode, ChannelId, Curve, Keyframe,
    SnippetData,
};
use crate::error::{json_kind, SnippetError};

/// Map an authored intensity onto [0, 1]. Values above 1 are read as percent, and
/// the result is clamped so stored keyframes never overshoot.
#[inline]
pub fn normalize_intensity(value: f32) -> f32 {
    let v = if value > 1.0 { value / 100.0 } else { value };
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Public API: parse authored snippet JSON text into canonical data.
pub fn parse_snippet_json(s: &str) -> Result<SnippetData, SnippetError> {
    let value: JsonValue = serde_json::from_str(s)?;
    normalize_snippet(&value)
}

/// Normalize an already-parsed JSON value in either authored shape.
pub fn normalize_snippet(value: &JsonValue) -> Result<SnippetData, SnippetError> {
    if !value.is_object() {
        return Err(SnippetError::NotAnObject {
            found: json_kind(value),
        });
    }
    let raw = RawSnippet::deserialize(value)?;

    let curves = match raw.curves {
        Some(map) => curves_from_map(map)?,
        None => curves_from_flat(raw.au.unwrap_or_default(), raw.viseme.unwrap_or_default()),
    };

    let name = match raw.name {
        Some(n) if n.trim().is_empty() => {
            return Err(SnippetError::field("name", "must not be blank"));
        }
        Some(n) => n,
        None => String::new(),
    };

    Ok(SnippetData {
        name,
        looping: raw.looping.unwrap_or(false),
        priority: raw.priority.map(to_priority).unwrap_or(0),
        playback_rate: coerce_playback_rate(raw.playback_rate.unwrap_or(1.0) as f32),
        intensity_scale: coerce_intensity_scale(raw.intensity_scale.unwrap_or(1.0) as f32),
        blend_mode: raw.blend_mode.unwrap_or_default(),
        category: raw.category.unwrap_or_else(|| "default".to_string()),
        curves,
    })
}

fn to_priority(p: f64) -> i32 {
    if p.is_finite() {
        p.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    } else {
        0
    }
}

fn make_key(time: Option<f64>, intensity: Option<f64>, inherit: Option<bool>) -> Keyframe {
    Keyframe {
        time: (time.unwrap_or(0.0) as f32).max(0.0),
        intensity: normalize_intensity(intensity.unwrap_or(0.0) as f32),
        inherit: inherit.unwrap_or(false),
    }
}

fn curves_from_map(
    map: IndexMap<ChannelId, JsonValue>,
) -> Result<IndexMap<ChannelId, Curve>, SnippetError> {
    let mut curves = IndexMap::with_capacity(map.len());
    for (channel, arr) in map {
        if !arr.is_array() {
            let reason = format!("expected keyframe array, got {}", json_kind(&arr));
            return Err(SnippetError::curve(channel, reason));
        }
        let keys: Vec<RawKey> = Vec::<RawKey>::deserialize(&arr)
            .map_err(|e| SnippetError::curve(channel.clone(), e.to_string()))?;
        let keyframes = keys
            .into_iter()
            .map(|k| make_key(k.time.or(k.t), k.intensity.or(k.v), k.inherit))
            .collect();
        curves.insert(channel, Curve::new(keyframes));
    }
    Ok(curves)
}

fn curves_from_flat(au: Vec<RawAuKey>, viseme: Vec<RawVisemeKey>) -> IndexMap<ChannelId, Curve> {
    let mut grouped: IndexMap<ChannelId, Vec<Keyframe>> = IndexMap::new();
    for k in au {
        grouped
            .entry(k.id.into_channel())
            .or_default()
            .push(make_key(k.t.or(k.time), k.v.or(k.intensity), k.inherit));
    }
    for k in viseme {
        grouped
            .entry(k.key.into_channel())
            .or_default()
            .push(make_key(k.t.or(k.time), k.v.or(k.intensity), k.inherit));
    }
    grouped
        .into_iter()
        .map(|(ch, keys)| (ch, Curve::new(keys)))
        .collect()
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawSnippet {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "loop", default)]
    looping: Option<bool>,
    #[serde(rename = "snippetPriority", default)]
    priority: Option<f64>,
    #[serde(rename = "snippetPlaybackRate", default)]
    playback_rate: Option<f64>,
    #[serde(rename = "snippetIntensityScale", default)]
    intensity_scale: Option<f64>,
    #[serde(rename = "snippetBlendMode", default)]
    blend_mode: Option<BlendMode>,
    #[serde(rename = "snippetCategory", default)]
    category: Option<String>,
    // Kept raw so a bad curve reports its channel.
    #[serde(default)]
    curves: Option<IndexMap<ChannelId, JsonValue>>,
    #[serde(default)]
    au: Option<Vec<RawAuKey>>,
    #[serde(default)]
    viseme: Option<Vec<RawVisemeKey>>,
}

#[derive(Debug, Deserialize)]
struct RawKey {
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    intensity: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
    #[serde(default)]
    inherit: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawAuKey {
    id: RawChannelRef,
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
    #[serde(default)]
    intensity: Option<f64>,
    #[serde(default)]
    inherit: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawVisemeKey {
    key: RawChannelRef,
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
    #[serde(default)]
    intensity: Option<f64>,
    #[serde(default)]
    inherit: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawChannelRef {
    Number(serde_json::Number),
    Text(String),
}

impl RawChannelRef {
    fn into_channel(self) -> ChannelId {
        match self {
            RawChannelRef::Text(s) => s,
            RawChannelRef::Number(n) => match n.as_u64() {
                Some(u) => u.to_string(),
                None => {
                    let f = n.as_f64().unwrap_or(0.0);
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                }
            },
        }
    }
}
