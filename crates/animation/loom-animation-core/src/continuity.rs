//! Continuity injection: start snippets (and inheriting loops) from the face's
//! current pose instead of the authored first value.

use hashbrown::HashMap;
use log::debug;

use crate::data::{ChannelId, Curve, SnippetData};

/// Last value applied to each channel, as recorded by the resolver.
#[derive(Clone, Debug, Default)]
pub struct LiveValues {
    map: HashMap<ChannelId, f32>,
}

impl LiveValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last applied value, or `None` if the channel was never driven.
    #[inline]
    pub fn get(&self, channel: &str) -> Option<f32> {
        self.map.get(channel).copied()
    }

    /// Last applied value, 0 if the channel was never driven.
    #[inline]
    pub fn value_or_zero(&self, channel: &str) -> f32 {
        self.get(channel).unwrap_or(0.0)
    }

    #[inline]
    pub fn set(&mut self, channel: &str, value: f32) {
        match self.map.get_mut(channel) {
            Some(v) => *v = value,
            None => {
                self.map.insert(channel.to_string(), value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.map.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Load-time continuity: every curve whose first keyframe sits at t=0 or is
/// flagged `inherit` starts from the channel's live value (0 if never applied).
/// Returns the number of rewritten curves.
pub fn seed_on_load(data: &mut SnippetData, live: &LiveValues, epsilon: f32) -> usize {
    let mut rewritten = 0;
    for (channel, curve) in data.curves.iter_mut() {
        let Some(first) = curve.first_mut() else {
            continue;
        };
        if !(first.inherit || first.time == 0.0) {
            continue;
        }
        let current = live.value_or_zero(channel);
        if (current - first.intensity).abs() > epsilon {
            debug!(
                "continuity: {} channel {} starts from {:.3} (was {:.3})",
                data.name, channel, current, first.intensity
            );
        }
        first.intensity = current;
        rewritten += 1;
    }
    rewritten
}

/// Loop-wrap continuity: only `inherit`-flagged first keyframes are refreshed, and
/// a channel that was never applied keeps its own value.
pub fn reseed_on_wrap<'a, I>(name: &str, curves: I, live: &LiveValues, epsilon: f32) -> usize
where
    I: IntoIterator<Item = (&'a ChannelId, &'a mut Curve)>,
{
    let mut rewritten = 0;
    for (channel, curve) in curves {
        let Some(first) = curve.first_mut() else {
            continue;
        };
        if !first.inherit {
            continue;
        }
        let current = live.get(channel).unwrap_or(first.intensity);
        if (first.intensity - current).abs() > epsilon {
            debug!(
                "loop continuity: {} channel {} resumes from {:.3}",
                name, channel, current
            );
        }
        first.intensity = current;
        rewritten += 1;
    }
    rewritten
}
