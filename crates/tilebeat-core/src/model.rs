use serde::{Deserialize, Serialize};

/// Angle value charts use to mark a midspin tile.
pub const MIDSPIN_ANGLE: f64 = 999.0;
pub const DEFAULT_BPM: f64 = 100.0;
pub const DEFAULT_VOLUME: f64 = 100.0;
pub const DEFAULT_PITCH: i32 = 100;

/// How a tile's base tempo is derived from its predecessor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum TempoChange {
    #[default]
    Inherit,
    Absolute(f64),
    Multiplier(f64),
}

impl TempoChange {
    /// Maps the legacy numeric encoding: `0` inherits, a negative value is a
    /// multiplier of the previous tempo, anything else is absolute.
    #[must_use]
    pub fn from_raw(raw: f64) -> Self {
        if raw == 0.0 {
            Self::Inherit
        } else if raw < 0.0 {
            Self::Multiplier(-raw)
        } else {
            Self::Absolute(raw)
        }
    }

    #[must_use]
    pub fn resolve(self, previous_bpm: f64) -> f64 {
        match self {
            Self::Inherit => previous_bpm,
            Self::Absolute(bpm) => bpm,
            Self::Multiplier(factor) => factor * previous_bpm,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RotationSense {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl RotationSense {
    /// A twirl inverts the sense inherited from the previous tile.
    #[must_use]
    pub fn flipped(self, twirl: bool) -> Self {
        match (self, twirl) {
            (sense, false) => sense,
            (Self::Clockwise, true) => Self::CounterClockwise,
            (Self::CounterClockwise, true) => Self::Clockwise,
        }
    }

    #[must_use]
    pub fn is_clockwise(self) -> bool {
        self == Self::Clockwise
    }
}

/// Raw attributes of one chart position before timeline resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TileSpec {
    pub angle: f64,
    pub tempo: TempoChange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_angle: Option<f64>,
    pub twirl: bool,
    pub pause_beats: f64,
    pub hold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl TileSpec {
    #[must_use]
    pub fn at_angle(angle: f64) -> Self {
        Self {
            angle,
            ..Self::default()
        }
    }

    /// The synthetic first tile carrying the chart-level tempo and volume.
    #[must_use]
    pub fn start(bpm: f64, volume: Option<f64>) -> Self {
        Self {
            tempo: TempoChange::Absolute(bpm),
            volume,
            ..Self::default()
        }
    }
}

/// A tile after the timeline pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tile {
    pub angle: f64,
    pub rotation: RotationSense,
    pub is_twirl: bool,
    pub is_midspin: bool,
    pub is_hold: bool,
    pub base_tempo: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_transition_angle: Option<f64>,
    pub pause_beats: f64,
    pub effective_tempo: f64,
    pub time_offset: f64,
    pub beat_count: f64,
    pub volume: f64,
}

/// Audible onset of a tile: where the click lands and how loud it is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Onset {
    pub time_offset: f64,
    pub volume: f64,
}

impl From<&Tile> for Onset {
    fn from(tile: &Tile) -> Self {
        Self {
            time_offset: tile.time_offset,
            volume: tile.volume,
        }
    }
}
