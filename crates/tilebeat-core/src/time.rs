#[must_use]
pub fn beats_to_seconds(beats: f64, bpm: f64) -> f64 {
    beats * (60.0 / bpm)
}

/// Sample frame at which `seconds` starts, truncated toward zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn seconds_to_sample_index(seconds: f64, sample_rate: u32) -> i64 {
    (seconds * f64::from(sample_rate)) as i64
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn samples_to_seconds(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }

    samples as f64 / f64::from(sample_rate)
}
