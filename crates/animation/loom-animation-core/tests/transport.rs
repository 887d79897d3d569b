use loom_animation_core::{
    BlendMode, Config, CoreEvent, Curve, Engine, Host, PlaybackState, SnippetData, SnippetUpdate,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

#[derive(Default)]
struct Rig {
    aus: Vec<(u32, f32)>,
    ended: Vec<String>,
}

impl Host for Rig {
    fn apply_au(&mut self, id: u32, value: f32) {
        self.aus.push((id, value));
    }
    fn set_morph(&mut self, _key: &str, _value: f32) {}
    fn on_snippet_end(&mut self, name: &str) {
        self.ended.push(name.to_string());
    }
}

fn engine() -> Engine<Rig> {
    Engine::new(Config::default(), Rig::default())
}

fn ramp(name: &str, duration: f32) -> SnippetData {
    SnippetData::new(name).with_curve("12", Curve::from_pairs(&[(0.0, 0.0), (duration, 1.0)]))
}

/// it should treat repeated stop_snippet calls as harmless and silent
#[test]
fn stop_snippet_is_idempotent_and_silent() {
    let mut eng = engine();
    eng.load(ramp("a", 1.0));
    eng.play();
    eng.step(0.25);

    assert!(eng.stop_snippet("a"));
    assert!(!eng.stop_snippet("a"));
    let out = eng.step(2.0);
    assert!(out.changes.is_empty());
    assert!(out
        .events
        .iter()
        .all(|e| !matches!(e, CoreEvent::SnippetEnded { .. })));
    assert!(eng.host().ended.is_empty());
    assert!(eng.snippet("a").is_none());
}

/// it should start a reused name fresh after stop_snippet
#[test]
fn reused_name_after_stop_has_no_stale_state() {
    let mut eng = engine();
    eng.load(ramp("a", 1.0));
    eng.play();
    eng.step(1.5);
    assert_eq!(eng.host().ended.len(), 1);

    eng.stop_snippet("a");
    eng.load(ramp("a", 1.0));
    eng.step(1.5);
    assert_eq!(eng.host().ended.len(), 2);
}

/// it should deliver control events with the next step, in call order
#[test]
fn control_events_are_queued_for_the_next_tick() {
    let mut eng = engine();
    eng.load(ramp("a", 1.0));
    eng.play();
    eng.load(ramp("a", 2.0));
    let out = eng.step(0.1);
    assert_eq!(
        out.events,
        vec![
            CoreEvent::SnippetLoaded {
                name: "a".into(),
                replaced: false
            },
            CoreEvent::PlaybackChanged {
                state: PlaybackState::Playing
            },
            CoreEvent::SnippetLoaded {
                name: "a".into(),
                replaced: true
            },
        ]
    );
    assert!(eng.step(0.1).events.is_empty());
}

/// it should freeze the clock on pause and deliver the pause event anyway
#[test]
fn global_pause_freezes_clock() {
    let mut eng = engine();
    eng.load(ramp("a", 4.0));
    eng.play();
    eng.step(1.0);
    eng.pause();
    assert!(!eng.is_playing());

    let out = eng.step(1.0);
    assert_eq!(
        out.events,
        vec![CoreEvent::PlaybackChanged {
            state: PlaybackState::Paused
        }]
    );
    assert!(out.changes.is_empty());
    assert_eq!(eng.play_time(), 1.0);
    assert!(!eng.schedule_snapshot()[0].playing);

    eng.play();
    let out = eng.step(1.0);
    approx(out.value_of("12").unwrap(), 0.5, 1e-6);
}

/// it should rewind the clock and unschedule snippets on stop
#[test]
fn global_stop_resets_schedule() {
    let mut eng = engine();
    eng.load(ramp("a", 4.0).with_loop(true));
    eng.play();
    eng.step(1.5);
    eng.stop();

    assert_eq!(eng.play_time(), 0.0);
    assert!(!eng.is_playing());
    let snap = eng.schedule_snapshot();
    assert!(!snap[0].enabled);
    assert_eq!(snap[0].starts_at, 0.0);
    assert_eq!(snap[0].offset, 0.0);

    eng.play();
    assert!(eng.step(0.5).changes.is_empty());

    assert!(eng.seek("a", 0.0));
    let out = eng.step(1.0);
    approx(out.value_of("12").unwrap(), 0.25, 1e-6);
}

/// it should preview the current pose from flush without advancing or completing
#[test]
fn flush_previews_without_advancing() {
    let mut eng = engine();
    eng.load(ramp("a", 1.0));
    eng.play();
    eng.step(0.25);
    eng.pause();

    let out = eng.flush();
    approx(out.value_of("12").unwrap(), 0.25, 1e-6);
    assert_eq!(eng.play_time(), 0.25);

    eng.seek("a", 3.0);
    let out = eng.flush();
    approx(out.value_of("12").unwrap(), 1.0, 1e-6);
    assert!(eng.host().ended.is_empty());
    assert!(eng.schedule_snapshot()[0].enabled);
}

/// it should apply a batch update with seek before play state
#[test]
fn update_snippet_batch() {
    let mut eng = engine();
    eng.load(ramp("a", 4.0));
    eng.play();
    eng.step(1.0);

    let update: SnippetUpdate = serde_json::from_str(
        r#"{ "playbackRate": 2, "time": 0.5, "playing": false, "blendMode": "additive", "loop": true }"#,
    )
    .unwrap();
    assert!(eng.update_snippet("a", update));

    let entry = &eng.schedule_snapshot()[0];
    assert_eq!(entry.playback_rate, 2.0);
    assert_eq!(entry.local_time, 0.5);
    assert!(!entry.playing);
    assert!(!entry.enabled);
    assert!(entry.looping);
    assert_eq!(entry.blend_mode, BlendMode::Additive);

    eng.set_snippet_playing("a", true);
    eng.step(0.5);
    // held at 0.5, then 0.5 s at 2x
    approx(eng.schedule_snapshot()[0].local_time, 1.5, 1e-6);
}

/// it should clamp negative and non-finite seek times to zero
#[test]
fn seek_clamps_bad_times() {
    let mut eng = engine();
    eng.load(ramp("a", 1.0));
    for t in [-2.0, f32::NAN, f32::NEG_INFINITY] {
        assert!(eng.seek("a", t));
        assert_eq!(eng.schedule_snapshot()[0].offset, 0.0);
    }
}

/// it should expose the schedule with wire-style field names
#[test]
fn snapshot_serializes_camel_case() {
    let mut eng = engine();
    eng.load(ramp("a", 2.0).with_priority(3).with_category("idle"));
    let snap = serde_json::to_value(eng.schedule_snapshot()).unwrap();
    let row = &snap[0];
    assert_eq!(row["name"], "a");
    assert_eq!(row["duration"], 2.0);
    assert_eq!(row["priority"], 3);
    assert_eq!(row["playbackRate"], 1.0);
    assert_eq!(row["intensityScale"], 1.0);
    assert_eq!(row["blendMode"], "replace");
    assert_eq!(row["loop"], false);
    assert_eq!(row["category"], "idle");
}

/// it should cap the number of events delivered per tick
#[test]
fn event_queue_is_bounded() {
    let cfg = Config {
        max_events_per_tick: 2,
        ..Config::default()
    };
    let mut eng = Engine::new(cfg, Rig::default());
    for i in 0..5 {
        eng.load(ramp(&format!("s{i}"), 1.0));
    }
    eng.play();
    assert_eq!(eng.step(0.1).events.len(), 2);
    assert!(eng.step(0.1).events.is_empty());
}

/// it should keep load order across replacement and removal
#[test]
fn names_follow_load_order() {
    let mut eng = engine();
    for n in ["c", "a", "b"] {
        eng.load(ramp(n, 1.0));
    }
    eng.load(ramp("a", 3.0));
    assert!(eng.remove("c"));
    assert_eq!(eng.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(eng.snippet("a").unwrap().duration(), 3.0);
    assert_eq!(eng.len(), 2);
}
