//! Engine: owns the snippet registry and the play clock, and drives the host.
//!
//! Methods:
//! - load / load_from_json / load_from_str / schedule, remove
//! - play / pause / stop, per-snippet transport and setters
//! - step (advance → sample → resolve → visemes → continuum → host), flush (preview)

use log::{debug, trace};
use serde_json::Value as JsonValue;

use crate::accumulate::{apply_intensity_scale, Contribution, Resolver};
use crate::config::Config;
use crate::continuity::{reseed_on_wrap, seed_on_load, LiveValues};
use crate::continuum::ContinuumMapper;
use crate::data::{coerce_intensity_scale, coerce_playback_rate, BlendMode, SnippetData};
use crate::error::SnippetError;
use crate::host::{au_id, Host};
use crate::ids::NameAllocator;
use crate::inputs::{ScheduleOpts, SnippetUpdate};
use crate::normalize::{normalize_snippet, parse_snippet_json};
use crate::outputs::{Change, CoreEvent, Outputs, PlaybackState, Route, ScheduleEntry};
use crate::registry::{Hold, Registry, Snippet};
use crate::sampling::sample_curve;
use crate::timing::{rebase_for_rate, Anchor};

/// What an evaluation pass is allowed to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pass {
    /// Realtime tick: honors per-snippet play state and fires completions.
    Step,
    /// Preview at the current play time: samples paused snippets too, never completes.
    Flush,
}

/// Non-finite or negative seconds become 0.
#[inline]
fn sanitize_secs(t: f32) -> f32 {
    if t.is_finite() {
        t.max(0.0)
    } else {
        0.0
    }
}

fn push_event(pending: &mut Vec<CoreEvent>, cap: usize, ev: CoreEvent) {
    if pending.len() < cap {
        pending.push(ev);
    } else {
        trace!("event queue full ({cap}); dropping {ev:?}");
    }
}

/// Snippet scheduler bound to one host.
pub struct Engine<H: Host> {
    cfg: Config,
    registry: Registry,
    live: LiveValues,
    continuum: ContinuumMapper,
    names: NameAllocator,
    play_time: f32,
    playing: bool,
    pending: Vec<CoreEvent>,
    outputs: Outputs,
    host: H,
}

impl<H: Host> Engine<H> {
    /// Create an engine with the given configuration. The clock starts stopped at 0.
    pub fn new(cfg: Config, host: H) -> Self {
        Self {
            cfg,
            registry: Registry::new(),
            live: LiveValues::new(),
            continuum: ContinuumMapper::new(),
            names: NameAllocator::new(),
            play_time: 0.0,
            playing: false,
            pending: Vec::new(),
            outputs: Outputs::default(),
            host,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn emit(&mut self, ev: CoreEvent) {
        push_event(&mut self.pending, self.cfg.max_events_per_tick, ev);
    }

    // ---------- loading ----------

    /// Register a snippet anchored at the current play time. A snippet with the same
    /// name is replaced in place. Curves whose first keyframe is at time 0 or marked
    /// `inherit` start from the channel's live value.
    pub fn load(&mut self, mut data: SnippetData) -> String {
        if data.name.is_empty() {
            let registry = &self.registry;
            data.name = self.names.alloc(|n| registry.contains(n));
        }
        data.playback_rate = coerce_playback_rate(data.playback_rate);
        data.intensity_scale = coerce_intensity_scale(data.intensity_scale);
        seed_on_load(&mut data, &self.live, self.cfg.continuity_epsilon);

        let name = data.name.clone();
        let mut snippet = Snippet::new(data, Anchor::at(self.play_time, 0.0));
        snippet.sync_loop_count(self.play_time);
        debug!(
            "load {} (duration {:.3}s, {} curves) at t={:.3}",
            name,
            snippet.duration(),
            snippet.data.curves.len(),
            self.play_time
        );
        let replaced = self.registry.insert(snippet).is_some();
        self.emit(CoreEvent::SnippetLoaded {
            name: name.clone(),
            replaced,
        });
        name
    }

    /// Normalize a JSON snippet (either wire shape) and load it.
    pub fn load_from_json(&mut self, value: &JsonValue) -> Result<String, SnippetError> {
        let data = normalize_snippet(value)?;
        Ok(self.load(data))
    }

    pub fn load_from_str(&mut self, json: &str) -> Result<String, SnippetError> {
        let data = parse_snippet_json(json)?;
        Ok(self.load(data))
    }

    /// Normalize, load and anchor a JSON snippet per `opts`.
    pub fn schedule(&mut self, value: &JsonValue, opts: ScheduleOpts) -> Result<String, SnippetError> {
        let data = normalize_snippet(value)?;
        Ok(self.schedule_data(data, opts))
    }

    /// Load canonical data and anchor it: `start_at_sec` is absolute play time,
    /// otherwise the start is `now + start_in_sec`. Starts never go below 0.
    pub fn schedule_data(&mut self, mut data: SnippetData, opts: ScheduleOpts) -> String {
        if let Some(priority) = opts.priority {
            data.priority = priority;
        }
        let starts_at = match opts.start_at_sec {
            Some(at) => sanitize_secs(at),
            None => sanitize_secs(self.play_time + opts.start_in_sec.unwrap_or(0.0)),
        };
        let offset = sanitize_secs(opts.offset_sec.unwrap_or(0.0));

        let name = self.load(data);
        if let Some(sn) = self.registry.get_mut(&name) {
            sn.playback.anchor = Anchor::new(starts_at, offset);
            sn.playback.enabled = true;
            sn.sync_loop_count(starts_at);
            debug!("schedule {name}: starts_at={starts_at:.3} offset={offset:.3}");
        }
        name
    }

    /// Remove a snippet and all of its bookkeeping. Returns false for unknown names.
    pub fn remove(&mut self, name: &str) -> bool {
        if self.registry.remove(name).is_none() {
            return false;
        }
        debug!("remove {name}");
        self.emit(CoreEvent::SnippetRemoved {
            name: name.to_string(),
        });
        true
    }

    // ---------- global transport ----------

    /// Start the play clock and mark every snippet playing.
    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        for sn in self.registry.iter_mut() {
            sn.playback.is_playing = true;
        }
        debug!("play at t={:.3}", self.play_time);
        self.emit(CoreEvent::PlaybackChanged {
            state: PlaybackState::Playing,
        });
    }

    /// Freeze the play clock and mark every snippet paused.
    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        for sn in self.registry.iter_mut() {
            sn.playback.is_playing = false;
        }
        debug!("pause at t={:.3}", self.play_time);
        self.emit(CoreEvent::PlaybackChanged {
            state: PlaybackState::Paused,
        });
    }

    /// Rewind the clock to 0 and unschedule every snippet (they stay loaded).
    pub fn stop(&mut self) {
        self.playing = false;
        self.play_time = 0.0;
        for sn in self.registry.iter_mut() {
            let pb = &mut sn.playback;
            pb.enabled = false;
            pb.is_playing = false;
            pb.anchor = Anchor::default();
            pb.current_time = 0.0;
            pb.last_loop = None;
            pb.held = None;
        }
        debug!("stop");
        self.emit(CoreEvent::PlaybackChanged {
            state: PlaybackState::Stopped,
        });
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    // ---------- per-snippet control ----------

    /// Jump a snippet to local `time` (seconds) at the current play time. Re-arms ended
    /// snippets and resumes paused ones.
    pub fn seek(&mut self, name: &str, time: f32) -> bool {
        let t_play = self.play_time;
        let Some(sn) = self.registry.get_mut(name) else {
            return false;
        };
        let time = sanitize_secs(time);
        sn.playback.anchor = Anchor::at(t_play, time);
        sn.playback.enabled = true;
        let now = sn.local_at(t_play);
        let pb = &mut sn.playback;
        pb.is_playing = true;
        pb.ended = false;
        // a seek never counts as a wrap; the next iteration boundary does
        pb.last_loop = now.map(|lt| lt.loop_count);
        pb.held = None;
        pb.current_time = now.map(|lt| lt.local).unwrap_or(time);
        debug!("seek {name} to {time:.3}");
        self.emit(CoreEvent::SnippetSeeked {
            name: name.to_string(),
            time,
        });
        true
    }

    /// `enable(name, true)` resumes, `enable(name, false)` pauses.
    pub fn enable(&mut self, name: &str, on: bool) -> bool {
        if on {
            self.resume_snippet(name)
        } else {
            self.pause_snippet(name)
        }
    }

    /// Hold a snippet at its current local time.
    pub fn pause_snippet(&mut self, name: &str) -> bool {
        let t_play = self.play_time;
        let Some(sn) = self.registry.get_mut(name) else {
            return false;
        };
        if sn.playback.enabled {
            let hold = match sn.local_at(t_play) {
                Some(lt) => Hold::At(lt.raw),
                None => Hold::Pending {
                    delay: sn.playback.anchor.starts_at - t_play,
                },
            };
            sn.playback.held = Some(hold);
            sn.playback.enabled = false;
        }
        sn.playback.is_playing = false;
        true
    }

    /// Continue a held snippet from where it was paused.
    pub fn resume_snippet(&mut self, name: &str) -> bool {
        let t_play = self.play_time;
        let Some(sn) = self.registry.get_mut(name) else {
            return false;
        };
        match sn.playback.held.take() {
            Some(Hold::At(raw)) => sn.playback.anchor = Anchor::at(t_play, raw),
            Some(Hold::Pending { delay }) => {
                sn.playback.anchor = Anchor::new(t_play + delay, sn.playback.anchor.offset);
            }
            None => {}
        }
        sn.playback.enabled = true;
        sn.playback.is_playing = true;
        true
    }

    /// Cancel a snippet. Unlike natural completion this never calls `on_snippet_end`.
    pub fn stop_snippet(&mut self, name: &str) -> bool {
        self.remove(name)
    }

    /// Change the playback rate without moving the snippet's current local time.
    pub fn set_snippet_playback_rate(&mut self, name: &str, rate: f32) -> bool {
        let t_play = self.play_time;
        let Some(sn) = self.registry.get_mut(name) else {
            return false;
        };
        let rate = coerce_playback_rate(rate);
        let old = sn.data.playback_rate;
        if sn.playback.enabled && sn.playback.held.is_none() {
            sn.playback.anchor = rebase_for_rate(sn.playback.anchor, old, t_play);
        }
        sn.data.playback_rate = rate;
        debug!("rate {name}: {old:.3} -> {rate:.3} at t={t_play:.3}");
        true
    }

    pub fn set_snippet_intensity_scale(&mut self, name: &str, scale: f32) -> bool {
        let Some(sn) = self.registry.get_mut(name) else {
            return false;
        };
        sn.data.intensity_scale = coerce_intensity_scale(scale);
        true
    }

    pub fn set_snippet_priority(&mut self, name: &str, priority: i32) -> bool {
        let Some(sn) = self.registry.get_mut(name) else {
            return false;
        };
        sn.data.priority = priority;
        true
    }

    pub fn set_snippet_loop(&mut self, name: &str, looping: bool) -> bool {
        let t_play = self.play_time;
        let Some(sn) = self.registry.get_mut(name) else {
            return false;
        };
        if sn.data.looping != looping {
            sn.data.looping = looping;
            // loop counts are not comparable across modes
            sn.sync_loop_count(t_play);
        }
        true
    }

    pub fn set_snippet_blend_mode(&mut self, name: &str, mode: BlendMode) -> bool {
        let Some(sn) = self.registry.get_mut(name) else {
            return false;
        };
        sn.data.blend_mode = mode;
        true
    }

    pub fn set_snippet_playing(&mut self, name: &str, playing: bool) -> bool {
        self.enable(name, playing)
    }

    pub fn set_snippet_time(&mut self, name: &str, time: f32) -> bool {
        self.seek(name, time)
    }

    /// Apply a batch of setter changes. `time` is applied before `playing`, so a
    /// seek-and-hold is expressed as `{ time, playing: false }`.
    pub fn update_snippet(&mut self, name: &str, update: SnippetUpdate) -> bool {
        if !self.registry.contains(name) {
            return false;
        }
        if let Some(rate) = update.playback_rate {
            self.set_snippet_playback_rate(name, rate);
        }
        if let Some(scale) = update.intensity_scale {
            self.set_snippet_intensity_scale(name, scale);
        }
        if let Some(priority) = update.priority {
            self.set_snippet_priority(name, priority);
        }
        if let Some(looping) = update.looping {
            self.set_snippet_loop(name, looping);
        }
        if let Some(mode) = update.blend_mode {
            self.set_snippet_blend_mode(name, mode);
        }
        if let Some(time) = update.time {
            self.seek(name, time);
        }
        if let Some(playing) = update.playing {
            self.set_snippet_playing(name, playing);
        }
        true
    }

    // ---------- ticking ----------

    /// Advance the play clock by `dt` seconds and apply the blended pose to the host.
    /// Does nothing (apart from delivering queued events) while paused or when `dt`
    /// is not a positive finite number.
    pub fn step(&mut self, dt: f32) -> &Outputs {
        self.outputs.clear();
        if !self.playing || !dt.is_finite() || dt <= 0.0 {
            self.outputs.events.append(&mut self.pending);
            return &self.outputs;
        }
        self.play_time += dt;
        self.evaluate(Pass::Step);
        &self.outputs
    }

    /// Resolve and apply the pose at the current play time without advancing it.
    /// Paused snippets are sampled too; completions never fire.
    pub fn flush(&mut self) -> &Outputs {
        self.outputs.clear();
        self.evaluate(Pass::Flush);
        &self.outputs
    }

    fn evaluate(&mut self, pass: Pass) {
        let t_play = self.play_time;
        let cap = self.cfg.max_events_per_tick;
        let epsilon = self.cfg.continuity_epsilon;
        let (min_ms, max_ms) = (self.cfg.min_tween_ms, self.cfg.max_tween_ms);

        let mut resolver = Resolver::new();
        let mut ended: Vec<String> = Vec::new();

        for sn in self.registry.iter_mut() {
            if pass == Pass::Step && !sn.playback.is_playing {
                continue;
            }
            let Some(lt) = sn.local_at(t_play) else {
                continue;
            };
            sn.playback.current_time = lt.local;

            if sn.data.looping {
                if let Some(prev) = sn.playback.last_loop {
                    if lt.loop_count > prev {
                        reseed_on_wrap(&sn.data.name, sn.data.curves.iter_mut(), &self.live, epsilon);
                        push_event(
                            &mut self.pending,
                            cap,
                            CoreEvent::SnippetLooped {
                                name: sn.data.name.clone(),
                                iteration: lt.loop_count,
                                local_time: lt.local,
                            },
                        );
                    }
                }
            }
            sn.playback.last_loop = Some(lt.loop_count);

            let rate = sn.data.playback_rate;
            for (channel, curve) in &sn.data.curves {
                let value = apply_intensity_scale(sample_curve(curve, lt.local), sn.data.intensity_scale);
                let next = curve.next_time_after(lt.local).unwrap_or(lt.duration);
                let duration_ms = ((next - lt.local) / rate * 1000.0).max(min_ms).min(max_ms);
                resolver.add(
                    channel,
                    Contribution {
                        snippet: &sn.data.name,
                        value,
                        priority: sn.data.priority,
                        blend_mode: sn.data.blend_mode,
                        duration_ms,
                        category: &sn.data.category,
                    },
                );
            }

            if pass == Pass::Step && !sn.playback.ended && lt.finished(sn.data.looping) {
                sn.playback.ended = true;
                sn.playback.enabled = false;
                sn.playback.is_playing = false;
                ended.push(sn.data.name.clone());
            }
        }

        let mut targets = resolver.finalize(self.cfg.additive_tween_ms);
        for (channel, target) in &targets {
            self.live.set(channel, target.value);
        }

        // Visemes go out as morphs before pair mapping sees the remaining channels.
        {
            let cfg = &self.cfg;
            let host = &mut self.host;
            let outputs = &mut self.outputs;
            targets.retain(|channel, target| {
                if !cfg.is_viseme_category(&target.category) {
                    return true;
                }
                let Some(key) = cfg.viseme_morph(channel) else {
                    return true;
                };
                host.transition_morph(key, target.value, target.duration_ms);
                outputs.push_change(Change {
                    channel: channel.clone(),
                    value: target.value,
                    route: Route::Viseme,
                });
                false
            });
        }

        let mapped = self
            .continuum
            .apply(&self.cfg.continuum, &targets, &mut self.host);
        for setter in mapped.newly_missing {
            push_event(&mut self.pending, cap, CoreEvent::ContinuumSetterMissing { setter });
        }

        for (channel, target) in &targets {
            let route = if mapped.consumed.contains(channel.as_str()) {
                Route::Continuum
            } else if let Some(id) = au_id(channel) {
                self.host.transition_au(id, target.value, self.cfg.au_transition_ms);
                Route::ActionUnit
            } else {
                self.host
                    .transition_morph(channel, target.value, self.cfg.morph_transition_ms);
                Route::Morph
            };
            self.outputs.push_change(Change {
                channel: channel.clone(),
                value: target.value,
                route,
            });
        }
        self.outputs.continuum = mapped.changes;

        for name in ended {
            debug!("{name} ended at t={t_play:.3}");
            self.host.on_snippet_end(&name);
            push_event(&mut self.pending, cap, CoreEvent::SnippetEnded { name });
        }
        self.outputs.events.append(&mut self.pending);
    }

    // ---------- queries ----------

    pub fn play_time(&self) -> f32 {
        self.play_time
    }

    /// Last applied value of a channel (0 if it was never driven).
    pub fn current_value(&self, channel: &str) -> f32 {
        self.live.value_or_zero(channel)
    }

    pub fn live_values(&self) -> &LiveValues {
        &self.live
    }

    pub fn snippet(&self, name: &str) -> Option<&Snippet> {
        self.registry.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Per-snippet schedule state at the current play time, in load order.
    pub fn schedule_snapshot(&self) -> Vec<ScheduleEntry> {
        let t_play = self.play_time;
        self.registry
            .iter()
            .map(|sn| {
                let local_time = sn
                    .local_at(t_play)
                    .map(|lt| lt.local)
                    .unwrap_or(sn.playback.current_time);
                ScheduleEntry {
                    name: sn.data.name.clone(),
                    enabled: sn.playback.enabled,
                    playing: sn.playback.is_playing,
                    starts_at: sn.playback.anchor.starts_at,
                    offset: sn.playback.anchor.offset,
                    local_time,
                    duration: sn.duration(),
                    looping: sn.data.looping,
                    priority: sn.data.priority,
                    playback_rate: sn.data.playback_rate,
                    intensity_scale: sn.data.intensity_scale,
                    blend_mode: sn.data.blend_mode,
                    category: sn.data.category.clone(),
                }
            })
            .collect()
    }
}

impl<H: Host + Default> Default for Engine<H> {
    fn default() -> Self {
        Self::new(Config::default(), H::default())
    }
}
