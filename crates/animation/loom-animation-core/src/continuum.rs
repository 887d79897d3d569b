//! Continuum mapping: antagonist channel pairs (gaze left/right, head up/down, ...)
//! become one signed value and a single bipolar host call.

use hashbrown::HashSet;
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::accumulate::Target;
use crate::data::ChannelId;
use crate::host::Host;

/// Bipolar host setters. Serialized with the host method names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContinuumSetter {
    #[serde(rename = "setEyesHorizontal")]
    EyesHorizontal,
    #[serde(rename = "setEyesVertical")]
    EyesVertical,
    #[serde(rename = "setHeadHorizontal")]
    HeadHorizontal,
    #[serde(rename = "setHeadVertical")]
    HeadVertical,
    #[serde(rename = "setHeadRoll")]
    HeadRoll,
    #[serde(rename = "setJawHorizontal")]
    JawHorizontal,
    #[serde(rename = "setTongueHorizontal")]
    TongueHorizontal,
    #[serde(rename = "setTongueVertical")]
    TongueVertical,
}

impl ContinuumSetter {
    pub const ALL: [ContinuumSetter; 8] = [
        ContinuumSetter::EyesHorizontal,
        ContinuumSetter::EyesVertical,
        ContinuumSetter::HeadHorizontal,
        ContinuumSetter::HeadVertical,
        ContinuumSetter::HeadRoll,
        ContinuumSetter::JawHorizontal,
        ContinuumSetter::TongueHorizontal,
        ContinuumSetter::TongueVertical,
    ];

    /// Host method name, e.g. `setEyesHorizontal`.
    pub fn method_name(self) -> &'static str {
        match self {
            ContinuumSetter::EyesHorizontal => "setEyesHorizontal",
            ContinuumSetter::EyesVertical => "setEyesVertical",
            ContinuumSetter::HeadHorizontal => "setHeadHorizontal",
            ContinuumSetter::HeadVertical => "setHeadVertical",
            ContinuumSetter::HeadRoll => "setHeadRoll",
            ContinuumSetter::JawHorizontal => "setJawHorizontal",
            ContinuumSetter::TongueHorizontal => "setTongueHorizontal",
            ContinuumSetter::TongueVertical => "setTongueVertical",
        }
    }
}

/// One antagonist pair: `value = final(positive) - final(negative)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuumPair {
    pub negative: ChannelId,
    pub positive: ChannelId,
    pub setter: ContinuumSetter,
}

impl ContinuumPair {
    pub fn new(negative: &str, positive: &str, setter: ContinuumSetter) -> Self {
        Self {
            negative: negative.to_string(),
            positive: positive.to_string(),
            setter,
        }
    }
}

/// Table of continuum pairs, evaluated in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuumTable {
    pub pairs: Vec<ContinuumPair>,
}

impl ContinuumTable {
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn with_pair(mut self, pair: ContinuumPair) -> Self {
        self.pairs.push(pair);
        self
    }
}

impl Default for ContinuumTable {
    /// FACS head/eye/jaw/tongue pairs for the default rig preset.
    fn default() -> Self {
        use ContinuumSetter::*;
        Self {
            pairs: vec![
                ContinuumPair::new("61", "62", EyesHorizontal),
                ContinuumPair::new("64", "63", EyesVertical),
                ContinuumPair::new("51", "52", HeadHorizontal),
                ContinuumPair::new("54", "53", HeadVertical),
                ContinuumPair::new("55", "56", HeadRoll),
                ContinuumPair::new("30", "35", JawHorizontal),
                ContinuumPair::new("39", "40", TongueHorizontal),
                ContinuumPair::new("37", "38", TongueVertical),
            ],
        }
    }
}

/// One bipolar call issued this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuumChange {
    pub setter: ContinuumSetter,
    pub value: f32,
    pub duration_ms: f32,
}

/// Result of a mapping pass.
#[derive(Debug, Default)]
pub struct ContinuumPass {
    /// Channels consumed by a bipolar call; not to be applied individually.
    pub consumed: HashSet<ChannelId>,
    pub changes: Vec<ContinuumChange>,
    /// Setters found missing on the host for the first time.
    pub newly_missing: Vec<ContinuumSetter>,
}

/// Stateful mapper: remembers which missing setters were already reported.
#[derive(Debug, Default)]
pub struct ContinuumMapper {
    warned: HashSet<ContinuumSetter>,
}

impl ContinuumMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue bipolar host calls for every active pair in `table`.
    pub fn apply<H: Host + ?Sized>(
        &mut self,
        table: &ContinuumTable,
        targets: &IndexMap<ChannelId, Target>,
        host: &mut H,
    ) -> ContinuumPass {
        let mut pass = ContinuumPass::default();
        let mut issued: HashSet<(ContinuumSetter, &str, &str)> = HashSet::new();

        for pair in &table.pairs {
            let neg = targets.get(&pair.negative);
            let pos = targets.get(&pair.positive);
            let neg_v = neg.map(|t| t.value).unwrap_or(0.0);
            let pos_v = pos.map(|t| t.value).unwrap_or(0.0);
            if neg_v <= 0.0 && pos_v <= 0.0 {
                continue;
            }

            if !host.supports_continuum(pair.setter) {
                if self.warned.insert(pair.setter) {
                    warn!(
                        "continuum: host is missing {}; applying {} and {} individually",
                        pair.setter.method_name(),
                        pair.negative,
                        pair.positive
                    );
                    pass.newly_missing.push(pair.setter);
                }
                continue;
            }

            let key = (pair.setter, pair.negative.as_str(), pair.positive.as_str());
            if issued.insert(key) {
                let value = pos_v - neg_v;
                let duration_ms = neg
                    .map(|t| t.duration_ms)
                    .unwrap_or(0.0)
                    .max(pos.map(|t| t.duration_ms).unwrap_or(0.0))
                    .max(0.0);
                if duration_ms > 0.0 {
                    host.transition_continuum(pair.setter, value, duration_ms);
                } else {
                    host.set_continuum(pair.setter, value);
                }
                pass.changes.push(ContinuumChange {
                    setter: pair.setter,
                    value,
                    duration_ms,
                });
            }
            pass.consumed.insert(pair.negative.clone());
            pass.consumed.insert(pair.positive.clone());
        }
        pass
    }
}
