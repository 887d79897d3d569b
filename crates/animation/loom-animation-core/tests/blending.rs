use loom_animation_core::{BlendMode, Curve, Engine, NullHost, SnippetData};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// Holds `value` on AU 12 for one second. Keys start after 0 so load-time
/// continuity leaves them alone.
fn hold(name: &str, value: f32) -> SnippetData {
    SnippetData::new(name).with_curve("12", Curve::from_pairs(&[(0.5, value), (1.0, value)]))
}

fn resolve(snippets: Vec<SnippetData>) -> f32 {
    let mut eng: Engine<NullHost> = Engine::default();
    for sn in snippets {
        eng.load(sn);
    }
    eng.play();
    let v = eng.step(0.25).value_of("12").expect("AU 12 driven");
    assert_eq!(eng.current_value("12"), v);
    v
}

/// it should let higher priority win even with a smaller value
#[test]
fn priority_beats_value() {
    let v = resolve(vec![
        hold("high", 0.3).with_priority(10),
        hold("low", 0.8).with_priority(1),
    ]);
    approx(v, 0.3, 1e-6);
}

/// it should keep the larger value on a priority tie, independent of load order
#[test]
fn tie_keeps_larger_value() {
    let a = resolve(vec![
        hold("a", 0.3).with_priority(5),
        hold("b", 0.8).with_priority(5),
    ]);
    let b = resolve(vec![
        hold("b", 0.8).with_priority(5),
        hold("a", 0.3).with_priority(5),
    ]);
    approx(a, 0.8, 1e-6);
    approx(b, 0.8, 1e-6);
}

/// it should sum additive snippets and stack them on the replace winner
#[test]
fn additive_stacking() {
    let only_additive = resolve(vec![
        hold("x", 0.3).with_blend_mode(BlendMode::Additive),
        hold("y", 0.4).with_blend_mode(BlendMode::Additive),
    ]);
    approx(only_additive, 0.7, 1e-6);

    let with_base = resolve(vec![
        hold("x", 0.3).with_blend_mode(BlendMode::Additive),
        hold("base", 0.2),
        hold("y", 0.4).with_blend_mode(BlendMode::Additive),
    ]);
    approx(with_base, 0.9, 1e-6);

    let saturated = resolve(vec![
        hold("x", 0.7).with_blend_mode(BlendMode::Additive),
        hold("base", 0.6),
    ]);
    approx(saturated, 1.0, 1e-6);
}

/// it should ignore priority for additive contributions
#[test]
fn additive_does_not_compete_on_priority() {
    let v = resolve(vec![
        hold("base", 0.5).with_priority(10),
        hold("breath", 0.1)
            .with_blend_mode(BlendMode::Additive)
            .with_priority(-5),
    ]);
    approx(v, 0.6, 1e-6);
}

/// it should scale intensity quadratically and clamp the result
#[test]
fn intensity_scale_is_quadratic() {
    approx(resolve(vec![hold("a", 0.8).with_intensity_scale(0.5)]), 0.2, 1e-6);
    approx(resolve(vec![hold("a", 0.4).with_intensity_scale(2.0)]), 1.0, 1e-6);
    approx(resolve(vec![hold("a", 0.8).with_intensity_scale(-1.0)]), 0.0, 1e-6);
}

/// it should never emit values outside [0, 1], even for percent-authored overshoot
#[test]
fn authored_overshoot_is_clamped() {
    let mut eng: Engine<NullHost> = Engine::default();
    eng.load_from_str(
        r#"{ "name": "loud", "curves": { "12": [{ "time": 0.5, "intensity": 200 }] } }"#,
    )
    .unwrap();
    eng.play();
    let out = eng.step(0.25);
    approx(out.value_of("12").unwrap(), 1.0, 1e-6);
    for change in &out.changes {
        assert!((0.0..=1.0).contains(&change.value));
    }
}

/// it should clamp percent overshoot at the keyframe so interpolation stays in range
#[test]
fn overshoot_is_clamped_before_interpolation() {
    let mut eng: Engine<NullHost> = Engine::default();
    eng.load_from_str(
        r#"{ "name": "ramp", "curves": { "12": [{ "time": 0.5, "intensity": 0 }, { "time": 1.5, "intensity": 200 }] } }"#,
    )
    .unwrap();
    assert_eq!(eng.snippet("ramp").unwrap().data.curves["12"].keyframes[1].intensity, 1.0);
    eng.play();
    // a quarter of the way from 0 to 1
    approx(eng.step(0.75).value_of("12").unwrap(), 0.25, 1e-5);
}

/// it should propagate scale changes made after load
#[test]
fn setters_take_effect_next_tick() {
    let mut eng: Engine<NullHost> = Engine::default();
    eng.load(hold("a", 0.3).with_priority(1));
    eng.load(hold("b", 0.8).with_priority(1));
    eng.play();
    approx(eng.step(0.1).value_of("12").unwrap(), 0.8, 1e-6);

    assert!(eng.set_snippet_priority("a", 2));
    approx(eng.step(0.1).value_of("12").unwrap(), 0.3, 1e-6);

    assert!(eng.set_snippet_blend_mode("b", BlendMode::Additive));
    approx(eng.step(0.1).value_of("12").unwrap(), 1.0, 1e-6);

    assert!(eng.set_snippet_intensity_scale("b", 0.5));
    approx(eng.step(0.1).value_of("12").unwrap(), 0.5, 1e-6);
}
