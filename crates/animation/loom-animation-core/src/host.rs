//! Host capability contract.
//!
//! The rig/rendering layer implements `Host` and hands it to the engine. Only
//! `apply_au` and `set_morph` are required; transitions fall back to immediate
//! application, and continuum setters are opt-in through `supports_continuum`.

use crate::continuum::ContinuumSetter;

pub trait Host {
    /// Drive a numeric Action Unit to `value` in [0, 1].
    fn apply_au(&mut self, id: u32, value: f32);

    /// Tween an Action Unit towards `value`.
    fn transition_au(&mut self, id: u32, value: f32, _duration_ms: f32) {
        self.apply_au(id, value);
    }

    /// Drive a named morph target (visemes and non-AU channels).
    fn set_morph(&mut self, key: &str, value: f32);

    fn transition_morph(&mut self, key: &str, value: f32, _duration_ms: f32) {
        self.set_morph(key, value);
    }

    /// Whether the host implements the given bipolar setter. Unsupported setters
    /// make the engine apply both channels of the pair individually.
    fn supports_continuum(&self, _setter: ContinuumSetter) -> bool {
        false
    }

    /// Bipolar setter, `value` in [-1, 1] (`setEyesHorizontal(v)` and friends).
    fn set_continuum(&mut self, _setter: ContinuumSetter, _value: f32) {}

    fn transition_continuum(&mut self, setter: ContinuumSetter, value: f32, _duration_ms: f32) {
        self.set_continuum(setter, value);
    }

    /// A non-looping snippet reached its end naturally. Called at most once per run.
    fn on_snippet_end(&mut self, _name: &str) {}
}

/// Host that ignores every call; useful for headless evaluation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost;

impl Host for NullHost {
    fn apply_au(&mut self, _id: u32, _value: f32) {}
    fn set_morph(&mut self, _key: &str, _value: f32) {}
}

impl<H: Host + ?Sized> Host for &mut H {
    fn apply_au(&mut self, id: u32, value: f32) {
        (**self).apply_au(id, value)
    }
    fn transition_au(&mut self, id: u32, value: f32, duration_ms: f32) {
        (**self).transition_au(id, value, duration_ms)
    }
    fn set_morph(&mut self, key: &str, value: f32) {
        (**self).set_morph(key, value)
    }
    fn transition_morph(&mut self, key: &str, value: f32, duration_ms: f32) {
        (**self).transition_morph(key, value, duration_ms)
    }
    fn supports_continuum(&self, setter: ContinuumSetter) -> bool {
        (**self).supports_continuum(setter)
    }
    fn set_continuum(&mut self, setter: ContinuumSetter, value: f32) {
        (**self).set_continuum(setter, value)
    }
    fn transition_continuum(&mut self, setter: ContinuumSetter, value: f32, duration_ms: f32) {
        (**self).transition_continuum(setter, value, duration_ms)
    }
    fn on_snippet_end(&mut self, name: &str) {
        (**self).on_snippet_end(name)
    }
}

/// Numeric channel ids ("12") are Action Units; everything else is a morph key.
pub fn au_id(channel: &str) -> Option<u32> {
    if channel.is_empty() || !channel.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    channel.parse().ok()
}
