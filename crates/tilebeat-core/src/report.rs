use std::{fs, io::Write, path::Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::{
    engine::{EngineError, RenderedTrack},
    persistence::write_atomically,
    time::samples_to_seconds,
    timeline::Timeline,
};

const REPORT_SCHEMA_VERSION: u32 = 1;

/// Fingerprint of one render, stable across runs for the same inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderReport {
    pub schema_version: u32,
    pub tile_count: usize,
    pub total_beats: f64,
    pub chart_seconds: f64,
    pub sample_rate: u32,
    pub sample_count: usize,
    pub audio_seconds: f64,
    pub pitch: i32,
    pub stretch_factor: f64,
    pub onsets_skipped: usize,
    pub peak_before_normalization: f32,
    pub normalization_gain: f32,
    pub timeline_hash: String,
    pub audio_hash: String,
}

impl RenderReport {
    #[must_use]
    pub fn from_track(track: &RenderedTrack, pitch: i32, stretch_factor: f64) -> Self {
        let mut audio_bytes = Vec::with_capacity(track.samples.len() * 2);
        for sample in &track.samples {
            audio_bytes.extend_from_slice(&sample.to_le_bytes());
        }

        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            tile_count: track.timeline.len(),
            total_beats: track.timeline.total_beats(),
            chart_seconds: track.timeline.duration_seconds(),
            sample_rate: track.sample_rate,
            sample_count: track.samples.len(),
            audio_seconds: samples_to_seconds(track.samples.len(), track.sample_rate),
            pitch,
            stretch_factor,
            onsets_skipped: track.mix.onsets_skipped,
            peak_before_normalization: track.mix.peak_before_normalization,
            normalization_gain: track.mix.normalization_gain,
            timeline_hash: timeline_hash(&track.timeline),
            audio_hash: hash_hex(&audio_bytes),
        }
    }
}

/// SHA-256 over each tile's offset, beat count, effective tempo and volume,
/// as little-endian `f64` bytes in tile order.
#[must_use]
pub fn timeline_hash(timeline: &Timeline) -> String {
    let mut bytes = Vec::with_capacity(timeline.len() * 32);
    for tile in timeline.tiles() {
        for value in [
            tile.time_offset,
            tile.beat_count,
            tile.effective_tempo,
            tile.volume,
        ] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    hash_hex(&bytes)
}

pub fn read_render_report(path: &Path) -> Result<RenderReport, EngineError> {
    let bytes = fs::read(path).map_err(|source| EngineError::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|error| EngineError::InvalidReport(error.to_string()))
}

#[instrument(skip(report), fields(path = %path.display()))]
pub fn write_render_report(path: &Path, report: &RenderReport) -> Result<(), EngineError> {
    let json = serde_json::to_vec_pretty(report)
        .map_err(|error| EngineError::output_write(path, error.to_string()))?;
    write_atomically(path, |file| {
        file.write_all(&json)
            .map_err(|error| EngineError::output_write(path, error.to_string()))
    })
}

fn hash_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}
