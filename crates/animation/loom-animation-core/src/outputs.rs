//! Output contracts from the engine.
//!
//! Host calls happen synchronously during `step`; `Outputs` is the tick's record
//! of what was resolved and applied, plus semantic events for UI layers.

use serde::{Deserialize, Serialize};

use crate::continuum::{ContinuumChange, ContinuumSetter};
use crate::data::BlendMode;

/// Final resolved value of one channel this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub channel: String,
    pub value: f32,
    /// How the value reached the host.
    pub route: Route,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Route {
    /// `transition_au`
    ActionUnit,
    /// `transition_morph` with the channel id as key
    Morph,
    /// `transition_morph` with a viseme key
    Viseme,
    /// Folded into a bipolar continuum call
    Continuum,
}

/// Global transport state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

/// Discrete semantic signals emitted by control calls and stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[non_exhaustive]
pub enum CoreEvent {
    SnippetLoaded {
        name: String,
        replaced: bool,
    },
    SnippetRemoved {
        name: String,
    },
    SnippetSeeked {
        name: String,
        time: f32,
    },
    SnippetLooped {
        name: String,
        iteration: i64,
        local_time: f32,
    },
    /// Natural completion of a non-looping snippet.
    SnippetEnded {
        name: String,
    },
    PlaybackChanged {
        state: PlaybackState,
    },
    ContinuumSetterMissing {
        setter: ContinuumSetter,
    },
}

/// Outputs returned by `Engine::step()` / `Engine::flush()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub continuum: Vec<ContinuumChange>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.continuum.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.continuum.is_empty() && self.events.is_empty()
    }

    /// Resolved value for a channel this tick, if it was driven.
    pub fn value_of(&self, channel: &str) -> Option<f32> {
        self.changes
            .iter()
            .find(|c| c.channel == channel)
            .map(|c| c.value)
    }
}

/// Introspection row returned by `Engine::schedule_snapshot()`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub name: String,
    pub enabled: bool,
    pub playing: bool,
    pub starts_at: f32,
    pub offset: f32,
    pub local_time: f32,
    pub duration: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub priority: i32,
    pub playback_rate: f32,
    pub intensity_scale: f32,
    pub blend_mode: BlendMode,
    pub category: String,
}
