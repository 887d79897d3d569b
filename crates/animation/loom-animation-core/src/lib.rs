//! Loom Animation Core (engine-agnostic)
//!
//! Snippet scheduling and channel blending for a parametric face rig. Snippets are
//! short keyframe curves over Action Unit and viseme channels; the engine plays many
//! of them at once, resolves one value per channel each tick (priority, then additive
//! stacking), keeps loops and reloads continuous, folds antagonist channel pairs into
//! bipolar setters and drives a host through the `Host` trait.

pub mod accumulate;
pub mod config;
pub mod continuity;
pub mod continuum;
pub mod data;
pub mod engine;
pub mod error;
pub mod host;
pub mod ids;
pub mod inputs;
pub mod normalize;
pub mod outputs;
pub mod registry;
pub mod sampling;
pub mod timing;

// Re-exports for consumers (host adapters)
pub use accumulate::{apply_intensity_scale, Target};
pub use config::{Config, DEFAULT_VISEME_KEYS};
pub use continuity::LiveValues;
pub use continuum::{ContinuumChange, ContinuumPair, ContinuumSetter, ContinuumTable};
pub use data::{BlendMode, ChannelId, Curve, Keyframe, SnippetData};
pub use engine::Engine;
pub use error::SnippetError;
pub use host::{au_id, Host, NullHost};
pub use inputs::{ScheduleOpts, SnippetUpdate};
pub use normalize::{normalize_intensity, normalize_snippet, parse_snippet_json};
pub use outputs::{Change, CoreEvent, Outputs, PlaybackState, Route, ScheduleEntry};
pub use registry::{Hold, Playback, Snippet};
pub use sampling::sample_curve;
pub use timing::{local_time, Anchor, LocalTime};
