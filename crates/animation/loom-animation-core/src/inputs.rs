//! Input contracts for the engine.
//!
//! Schedule options and batched per-snippet updates. Adapters (UI, scripted
//! sequencers) build these and pass them into `Engine::schedule` / `Engine::update_snippet`.

use serde::{Deserialize, Serialize};

use crate::data::BlendMode;

/// Where and how a scheduled snippet starts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOpts {
    /// Overrides the snippet's authored priority.
    #[serde(default)]
    pub priority: Option<i32>,
    /// Absolute play time (s) to start at. Takes precedence over `start_in_sec`.
    #[serde(default)]
    pub start_at_sec: Option<f32>,
    /// Delay (s) relative to the current play time.
    #[serde(default)]
    pub start_in_sec: Option<f32>,
    /// Local time (s) the snippet reads when it starts.
    #[serde(default)]
    pub offset_sec: Option<f32>,
}

impl ScheduleOpts {
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn start_at(mut self, sec: f32) -> Self {
        self.start_at_sec = Some(sec);
        self
    }

    pub fn start_in(mut self, sec: f32) -> Self {
        self.start_in_sec = Some(sec);
        self
    }

    pub fn offset(mut self, sec: f32) -> Self {
        self.offset_sec = Some(sec);
        self
    }
}

/// Batched per-snippet parameter changes; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetUpdate {
    #[serde(default)]
    pub playback_rate: Option<f32>,
    #[serde(default)]
    pub intensity_scale: Option<f32>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default, rename = "loop")]
    pub looping: Option<bool>,
    #[serde(default)]
    pub blend_mode: Option<BlendMode>,
    #[serde(default)]
    pub playing: Option<bool>,
    /// Seek target in local seconds.
    #[serde(default)]
    pub time: Option<f32>,
}
