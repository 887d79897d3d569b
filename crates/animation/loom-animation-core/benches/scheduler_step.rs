use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loom_animation_core::{BlendMode, Config, Curve, Engine, NullHost, SnippetData};

/// `count` overlapping snippets over a shared pool of AU channels, every fourth one additive.
fn build_engine(count: usize) -> Engine<NullHost> {
    let mut eng = Engine::new(Config::default(), NullHost);
    for i in 0..count {
        let mut sn = SnippetData::new(format!("sn{i}"))
            .with_loop(true)
            .with_priority((i % 7) as i32)
            .with_playback_rate(0.5 + (i % 5) as f32 * 0.25);
        if i % 4 == 0 {
            sn = sn.with_blend_mode(BlendMode::Additive);
        }
        for c in 0..8 {
            let channel = (40 + (i + c) % 32).to_string();
            let keys: Vec<(f32, f32)> = (0..6)
                .map(|k| (k as f32 * 0.4, ((k + c) % 3) as f32 * 0.4))
                .collect();
            sn = sn.with_curve(channel, Curve::from_pairs(&keys));
        }
        eng.load(sn);
    }
    eng.play();
    eng
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_step");
    for &count in &[8usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut eng = build_engine(count);
            b.iter(|| {
                let out = eng.step(black_box(1.0 / 60.0));
                black_box(out.changes.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
