pub mod assets;
pub mod chart;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod export;
pub mod fixtures;
pub mod mixer;
pub mod model;
pub mod persistence;
pub mod report;
pub mod resample;
pub mod time;
pub mod timeline;

pub use assets::{ClickSample, DecodedAudio, decode_reference_sample, load_click};
pub use chart::{Chart, load_chart, parse_chart};
pub use config::AppConfig;
pub use diagnostics::{TelemetryGuard, init_tracing};
pub use engine::{Engine, EngineError, RenderOutcome, RenderRequest, RenderedTrack};
pub use mixer::{MixOutput, MixSummary, render_mix};
pub use model::{Onset, RotationSense, TempoChange, Tile, TileSpec};
pub use report::RenderReport;
pub use timeline::{Timeline, TimelineDefaults, advance, build_timeline};
