//! Core configuration for loom-animation-core.

use serde::{Deserialize, Serialize};

use crate::continuum::ContinuumTable;

/// Viseme morph names in the rig's canonical order; a numeric viseme id indexes this list.
pub const DEFAULT_VISEME_KEYS: [&str; 15] = [
    "EE", "Er", "IH", "Ah", "Oh", "W_OO", "S_Z", "Ch_J", "F_V", "TH", "T_L_D_N", "B_M_P",
    "K_G_H_NG", "AE", "R",
];

/// Engine tuning: continuum pairs, viseme routing and host transition timings.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Antagonist channel pairs driven through a single bipolar host setter.
    pub continuum: ContinuumTable,

    /// Viseme morph names (index = numeric viseme id).
    pub viseme_keys: Vec<String>,
    /// Snippet categories whose channels are routed to viseme morphs.
    pub viseme_categories: Vec<String>,

    /// Transition durations handed to the host for individually applied channels.
    pub au_transition_ms: f32,
    pub morph_transition_ms: f32,

    /// Bounds for per-target tween durations derived from the next keyframe.
    pub min_tween_ms: f32,
    pub max_tween_ms: f32,
    /// Tween used for channels driven only by additive snippets.
    pub additive_tween_ms: f32,

    /// Continuity rewrites smaller than this are not logged.
    pub continuity_epsilon: f32,

    /// Maximum events to retain per tick; later events in the same tick are dropped.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            continuum: ContinuumTable::default(),
            viseme_keys: DEFAULT_VISEME_KEYS.iter().map(|k| k.to_string()).collect(),
            viseme_categories: vec!["visemeSnippet".into(), "combined".into()],
            au_transition_ms: 120.0,
            morph_transition_ms: 80.0,
            min_tween_ms: 50.0,
            max_tween_ms: 1000.0,
            additive_tween_ms: 120.0,
            continuity_epsilon: 0.001,
            max_events_per_tick: 1024,
        }
    }
}

impl Config {
    /// Resolve a channel id to a viseme morph name: either a numeric index into
    /// `viseme_keys` or a literal key present in the list.
    pub fn viseme_morph(&self, channel: &str) -> Option<&str> {
        if let Ok(idx) = channel.parse::<usize>() {
            return self.viseme_keys.get(idx).map(String::as_str);
        }
        self.viseme_keys
            .iter()
            .find(|k| k.as_str() == channel)
            .map(String::as_str)
    }

    pub fn is_viseme_category(&self, category: &str) -> bool {
        self.viseme_categories.iter().any(|c| c == category)
    }
}
