use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    model::{
        DEFAULT_BPM, DEFAULT_VOLUME, MIDSPIN_ANGLE, Onset, RotationSense, TempoChange, Tile,
        TileSpec,
    },
    time::beats_to_seconds,
};

/// Values the start tile falls back to when the chart leaves them unset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimelineDefaults {
    #[serde(rename = "default_bpm", alias = "bpm")]
    pub bpm: f64,
    #[serde(rename = "default_volume", alias = "volume")]
    pub volume: f64,
}

impl Default for TimelineDefaults {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Resolves one tile from its raw spec and its already resolved predecessor.
#[must_use]
pub fn advance(spec: &TileSpec, previous: Option<&Tile>, pitch_factor: f64) -> Tile {
    advance_with(spec, previous, pitch_factor, &TimelineDefaults::default())
}

#[must_use]
pub fn advance_with(
    spec: &TileSpec,
    previous: Option<&Tile>,
    pitch_factor: f64,
    defaults: &TimelineDefaults,
) -> Tile {
    match previous {
        None => start_tile(spec, defaults),
        Some(previous) => next_tile(spec, previous, pitch_factor),
    }
}

fn start_tile(spec: &TileSpec, defaults: &TimelineDefaults) -> Tile {
    let tempo = match spec.tempo {
        TempoChange::Absolute(bpm) if bpm > 0.0 => bpm,
        _ => defaults.bpm,
    };
    let volume = spec
        .volume
        .filter(|volume| *volume >= 0.0)
        .unwrap_or(defaults.volume);

    Tile {
        angle: spec.angle,
        rotation: RotationSense::Clockwise.flipped(spec.twirl),
        is_twirl: spec.twirl,
        is_midspin: false,
        is_hold: spec.hold,
        base_tempo: tempo,
        tempo_transition_angle: spec.transition_angle,
        pause_beats: spec.pause_beats,
        effective_tempo: tempo,
        time_offset: 0.0,
        beat_count: 0.0,
        volume,
    }
}

#[allow(clippy::float_cmp)]
fn next_tile(spec: &TileSpec, previous: &Tile, pitch_factor: f64) -> Tile {
    let is_midspin = spec.angle == MIDSPIN_ANGLE;
    let angle = if is_midspin {
        previous.angle - 180.0
    } else {
        spec.angle
    };

    let mut delta_angle = 180.0 - angle + previous.angle;
    if delta_angle >= 360.0 {
        delta_angle -= 360.0;
    } else if delta_angle < 0.0 {
        delta_angle += 360.0;
    }

    let rotation = previous.rotation.flipped(spec.twirl);
    let angle_offset = match rotation {
        // A straight-back clockwise turn is a full revolution, not a zero-length one.
        RotationSense::Clockwise if delta_angle == 0.0 && !is_midspin => 360.0,
        RotationSense::Clockwise => delta_angle,
        RotationSense::CounterClockwise if is_midspin => 0.0,
        RotationSense::CounterClockwise => 360.0 - delta_angle,
    };

    let base_tempo = spec.tempo.resolve(previous.base_tempo);
    let effective_tempo = match spec.transition_angle {
        Some(transition) if transition > 0.0 && angle_offset > 0.0 => {
            (base_tempo * (angle_offset - transition) + previous.base_tempo * transition)
                / angle_offset
        }
        _ => base_tempo,
    };

    let delta_beat = angle_offset / 180.0 + spec.pause_beats;
    let time_offset =
        previous.time_offset + beats_to_seconds(delta_beat, effective_tempo) * pitch_factor;

    Tile {
        angle,
        rotation,
        is_twirl: spec.twirl,
        is_midspin,
        is_hold: spec.hold,
        base_tempo,
        tempo_transition_angle: spec.transition_angle,
        pause_beats: spec.pause_beats,
        effective_tempo,
        time_offset,
        beat_count: previous.beat_count + delta_beat,
        volume: spec
            .volume
            .filter(|volume| *volume >= 0.0)
            .unwrap_or(previous.volume),
    }
}

/// Fully resolved tile sequence, built once and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Timeline {
    tiles: Vec<Tile>,
}

impl Timeline {
    #[instrument(skip(specs), fields(tile_count = specs.len()))]
    pub fn build(specs: &[TileSpec], defaults: &TimelineDefaults) -> Self {
        let mut tiles: Vec<Tile> = Vec::with_capacity(specs.len());
        for spec in specs {
            let tile = advance_with(spec, tiles.last(), 1.0, defaults);
            tiles.push(tile);
        }

        let timeline = Self { tiles };
        debug!(
            tiles = timeline.tiles.len(),
            duration_seconds = timeline.duration_seconds(),
            total_beats = timeline.total_beats(),
            "timeline resolved"
        );
        timeline
    }

    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Onsets of every audible tile; the start tile has none.
    #[must_use]
    pub fn onsets(&self) -> Vec<Onset> {
        self.tiles.iter().skip(1).map(Onset::from).collect()
    }

    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.tiles.last().map_or(0.0, |tile| tile.time_offset)
    }

    #[must_use]
    pub fn total_beats(&self) -> f64 {
        self.tiles.last().map_or(0.0, |tile| tile.beat_count)
    }
}

/// Left-to-right fold over raw specs.
#[must_use]
pub fn build_timeline(specs: &[TileSpec], defaults: &TimelineDefaults) -> Vec<Tile> {
    Timeline::build(specs, defaults).tiles
}
