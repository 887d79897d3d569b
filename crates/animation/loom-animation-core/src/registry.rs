//! Snippet registry: the live, name-keyed collection of loaded snippets.
//!
//! Pure data, no timing logic. Each entry owns its playback bookkeeping, so
//! removing a name drops every piece of state attached to it.

use indexmap::IndexMap;

use crate::data::SnippetData;
use crate::timing::{local_time, Anchor, LocalTime};

/// Position captured by `pause_snippet`, consumed by resume.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Hold {
    /// Raw local time of a snippet that was running.
    At(f32),
    /// Seconds left before a scheduled start.
    Pending { delay: f32 },
}

/// Mutable playback state of one snippet.
#[derive(Clone, Debug, PartialEq)]
pub struct Playback {
    pub anchor: Anchor,
    /// Scheduling switch; disabled snippets are never sampled.
    pub enabled: bool,
    /// Per-snippet play flag (global pause clears it for every snippet).
    pub is_playing: bool,
    /// Natural completion already reported for the current run.
    pub ended: bool,
    /// Local time at the last evaluation.
    pub current_time: f32,
    /// Loop count at the last evaluation; `None` until first evaluated.
    pub last_loop: Option<i64>,
    pub held: Option<Hold>,
}

impl Playback {
    pub fn anchored(anchor: Anchor) -> Self {
        Self {
            anchor,
            enabled: true,
            is_playing: true,
            ended: false,
            current_time: 0.0,
            last_loop: None,
            held: None,
        }
    }
}

/// A loaded snippet: authored data plus playback state.
#[derive(Clone, Debug, PartialEq)]
pub struct Snippet {
    pub data: SnippetData,
    pub playback: Playback,
    duration: f32,
}

impl Snippet {
    pub fn new(data: SnippetData, anchor: Anchor) -> Self {
        let duration = data.duration();
        Self {
            data,
            playback: Playback::anchored(anchor),
            duration,
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Latest keyframe time across all curves.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Record the loop iteration the anchor gives at `t_play`, so the next wrap
    /// is measured from here rather than from the previous schedule.
    pub fn sync_loop_count(&mut self, t_play: f32) {
        self.playback.last_loop = self.local_at(t_play).map(|lt| lt.loop_count);
    }

    /// Local time at `t_play`; `None` when disabled or not started yet.
    pub fn local_at(&self, t_play: f32) -> Option<LocalTime> {
        if !self.playback.enabled {
            return None;
        }
        local_time(
            self.playback.anchor,
            self.data.playback_rate,
            self.duration,
            self.data.looping,
            t_play,
        )
    }
}

/// Minimal snippet library storage, ordered by first insertion.
#[derive(Default, Debug)]
pub struct Registry {
    items: IndexMap<String, Snippet>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snippet; an existing entry with the same name is replaced in place
    /// (keeping its position). Returns the replaced entry, if any.
    pub fn insert(&mut self, snippet: Snippet) -> Option<Snippet> {
        self.items.insert(snippet.data.name.clone(), snippet)
    }

    pub fn remove(&mut self, name: &str) -> Option<Snippet> {
        self.items.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Snippet> {
        self.items.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Snippet> {
        self.items.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snippet> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Snippet> {
        self.items.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
