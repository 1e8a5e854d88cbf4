use std::{fs, path::Path};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    engine::EngineError,
    model::{TempoChange, TileSpec},
};

/// Legacy path characters and the direction, in degrees, each one encodes.
pub const PATH_ANGLES: [(char, f64); 29] = [
    ('R', 0.0),
    ('p', 15.0),
    ('J', 30.0),
    ('E', 45.0),
    ('T', 60.0),
    ('o', 75.0),
    ('U', 90.0),
    ('q', 105.0),
    ('G', 120.0),
    ('Q', 135.0),
    ('H', 150.0),
    ('W', 165.0),
    ('L', 180.0),
    ('x', 195.0),
    ('N', 210.0),
    ('Z', 225.0),
    ('F', 240.0),
    ('V', 255.0),
    ('D', 270.0),
    ('Y', 285.0),
    ('B', 300.0),
    ('C', 315.0),
    ('M', 330.0),
    ('A', 345.0),
    ('5', 555.0),
    ('6', 666.0),
    ('7', 777.0),
    ('8', 888.0),
    ('!', 999.0),
];

/// Unknown characters read as 0 degrees.
#[must_use]
pub fn path_angle(symbol: char) -> f64 {
    PATH_ANGLES
        .iter()
        .find(|(candidate, _)| *candidate == symbol)
        .map_or(0.0, |(_, angle)| *angle)
}

/// Raw tile specs of one chart; `specs[0]` is the synthetic start tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub bpm: f64,
    pub volume: Option<f64>,
    pub specs: Vec<TileSpec>,
}

impl Chart {
    /// Number of audible tiles, excluding the start tile.
    #[must_use]
    pub fn floor_count(&self) -> usize {
        self.specs.len().saturating_sub(1)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartDocument {
    settings: ChartSettings,
    #[serde(default)]
    angle_data: Option<Vec<f64>>,
    #[serde(default)]
    path_data: Option<String>,
    #[serde(default)]
    actions: Vec<ChartAction>,
}

#[derive(Debug, Deserialize)]
struct ChartSettings {
    bpm: f64,
    #[serde(default)]
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartAction {
    #[serde(default)]
    floor: Option<i64>,
    #[serde(default)]
    event_type: String,
    #[serde(default)]
    speed_type: Option<String>,
    #[serde(default)]
    beats_per_minute: Option<f64>,
    #[serde(default)]
    bpm_multiplier: Option<f64>,
    #[serde(default)]
    angle_offset: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    hitsound_volume: Option<f64>,
}

#[instrument(fields(path = %path.display()))]
pub fn load_chart(path: &Path) -> Result<Chart, EngineError> {
    let bytes = fs::read(path).map_err(|source| EngineError::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8(bytes)
        .map_err(|error| EngineError::MalformedChart(format!("chart is not utf-8: {error}")))?;

    let chart = parse_chart(&content)?;
    info!(
        floors = chart.floor_count(),
        bpm = chart.bpm,
        "chart loaded"
    );
    Ok(chart)
}

pub fn parse_chart(content: &str) -> Result<Chart, EngineError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let cleaned = strip_trailing_commas(content);
    let document: ChartDocument = serde_json::from_str(&cleaned)
        .map_err(|error| EngineError::MalformedChart(error.to_string()))?;

    let angles = match (document.angle_data, document.path_data) {
        (Some(angles), _) => angles,
        (None, Some(path)) => path.chars().map(path_angle).collect(),
        (None, None) => {
            return Err(EngineError::MalformedChart(
                "chart has neither angleData nor pathData".to_string(),
            ));
        }
    };

    let mut specs = Vec::with_capacity(angles.len() + 1);
    specs.push(TileSpec::start(
        document.settings.bpm,
        document.settings.volume,
    ));
    specs.extend(angles.into_iter().map(TileSpec::at_angle));

    let mut ignored = 0_usize;
    for action in &document.actions {
        let Some(spec) = action
            .floor
            .and_then(|floor| usize::try_from(floor).ok())
            .and_then(|floor| floor.checked_add(1))
            .and_then(|index| specs.get_mut(index))
        else {
            ignored += 1;
            continue;
        };
        apply_action(spec, action)?;
    }

    if ignored > 0 {
        warn!(ignored, "actions without a valid floor were ignored");
    }
    debug!(
        tiles = specs.len(),
        actions = document.actions.len(),
        "chart parsed"
    );

    Ok(Chart {
        bpm: document.settings.bpm,
        volume: document.settings.volume,
        specs,
    })
}

fn apply_action(spec: &mut TileSpec, action: &ChartAction) -> Result<(), EngineError> {
    match action.event_type.as_str() {
        "SetSpeed" => {
            spec.tempo = if action.speed_type.as_deref() == Some("Bpm") {
                TempoChange::from_raw(required(action, action.beats_per_minute, "beatsPerMinute")?)
            } else {
                TempoChange::from_raw(-required(action, action.bpm_multiplier, "bpmMultiplier")?)
            };
            spec.transition_angle = action.angle_offset.filter(|angle| *angle > 0.0);
        }
        "Twirl" => spec.twirl = true,
        "Pause" => spec.pause_beats = required(action, action.duration, "duration")?,
        "Hold" => {
            spec.hold = true;
            spec.pause_beats += required(action, action.duration, "duration")? * 2.0;
        }
        "SetHitsound" => {
            spec.volume = Some(required(action, action.hitsound_volume, "hitsoundVolume")?);
        }
        _ => {}
    }
    Ok(())
}

fn required(action: &ChartAction, value: Option<f64>, field: &str) -> Result<f64, EngineError> {
    value.ok_or_else(|| {
        EngineError::MalformedChart(format!(
            "{} event at floor {} is missing {field}",
            action.event_type,
            action.floor.unwrap_or(-1)
        ))
    })
}

/// Drops commas that directly precede a closing bracket, outside of string
/// literals. Chart editors routinely emit them.
#[must_use]
pub fn strip_trailing_commas(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut pending_comma: Option<usize> = None;
    let mut in_string = false;
    let mut escaped = false;

    for ch in content.chars() {
        if in_string {
            output.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                pending_comma = None;
                in_string = true;
                output.push(ch);
            }
            ',' => {
                pending_comma = Some(output.len());
                output.push(ch);
            }
            '}' | ']' => {
                if let Some(index) = pending_comma.take() {
                    output.remove(index);
                }
                output.push(ch);
            }
            ch if ch.is_whitespace() => output.push(ch),
            _ => {
                pending_comma = None;
                output.push(ch);
            }
        }
    }

    output
}
