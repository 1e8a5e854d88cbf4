use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    assets::{ClickSample, load_click},
    chart::{Chart, load_chart},
    config::AppConfig,
    export::{default_output_path, write_wav_mono_i16},
    mixer::{MixOutput, MixSummary, render_mix},
    report::RenderReport,
    timeline::Timeline,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot open input {}: {source}", .path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed chart: {0}")]
    MalformedChart(String),
    #[error("malformed audio: {0}")]
    MalformedAudio(String),
    #[error("failed to write {}: {reason}", .path.display())]
    OutputWrite { path: PathBuf, reason: String },
    #[error("invalid config: {0}")]
    Config(String),
    #[error("invalid render report: {0}")]
    InvalidReport(String),
}

impl EngineError {
    pub fn output_write(path: &Path, reason: impl Into<String>) -> Self {
        Self::OutputWrite {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub chart_path: PathBuf,
    pub reference_sample: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub pitch: Option<i32>,
}

impl RenderRequest {
    #[must_use]
    pub fn new(chart_path: impl Into<PathBuf>) -> Self {
        Self {
            chart_path: chart_path.into(),
            reference_sample: None,
            output_path: None,
            pitch: None,
        }
    }
}

/// Click track rendered in memory, before it is written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTrack {
    pub timeline: Timeline,
    pub sample_rate: u32,
    pub samples: Vec<i16>,
    pub mix: MixSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub output_path: PathBuf,
    pub track: RenderedTrack,
    pub report: RenderReport,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: AppConfig,
}

impl Engine {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Chart file to WAV file.
    #[instrument(skip(self), fields(chart = %request.chart_path.display()))]
    pub fn render(&self, request: &RenderRequest) -> Result<RenderOutcome, EngineError> {
        let pitch = request.pitch.unwrap_or(self.config.audio.default_pitch);
        let reference = request
            .reference_sample
            .clone()
            .unwrap_or_else(|| self.config.audio.resolve_reference_sample());
        let output_path = request
            .output_path
            .clone()
            .unwrap_or_else(|| default_output_path(&request.chart_path, pitch));

        let started = Instant::now();
        let chart = load_chart(&request.chart_path)?;
        info!(
            elapsed_ms = started.elapsed().as_millis(),
            "chart stage finished"
        );

        let started = Instant::now();
        let click = load_click(&reference, pitch)?;
        let track = self.render_chart(&chart, &click);
        write_wav_mono_i16(&output_path, track.sample_rate, &track.samples)?;
        info!(
            elapsed_ms = started.elapsed().as_millis(),
            output = %output_path.display(),
            "synthesis stage finished"
        );

        let report = RenderReport::from_track(&track, pitch, click.stretch_factor);
        Ok(RenderOutcome {
            output_path,
            track,
            report,
        })
    }

    /// Resolves the timeline of `chart` and mixes `click` onto every onset.
    #[instrument(skip(self, chart, click), fields(floors = chart.floor_count()))]
    pub fn render_chart(&self, chart: &Chart, click: &ClickSample) -> RenderedTrack {
        let timeline = Timeline::build(&chart.specs, &self.config.timeline);
        let MixOutput { samples, summary } =
            render_mix(&timeline.onsets(), &click.samples, click.sample_rate);

        RenderedTrack {
            timeline,
            sample_rate: click.sample_rate,
            samples,
            mix: summary,
        }
    }
}
