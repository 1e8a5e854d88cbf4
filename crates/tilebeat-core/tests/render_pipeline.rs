use std::path::Path;

use tempfile::tempdir;
use tilebeat_core::{
    AppConfig, Engine, EngineError, RenderRequest,
    export::read_wav_i16,
    fixtures::{straight_chart_json, synthetic_click, write_reference_wav},
    report::{read_render_report, write_render_report},
};

const SAMPLE_RATE: u32 = 44_100;

fn write_chart(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("chart should be writable");
    path
}

fn reference(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("hit.wav");
    write_reference_wav(&path, SAMPLE_RATE, 1, &synthetic_click(SAMPLE_RATE, 2_000))
        .expect("reference wav should be writable");
    path
}

#[test]
fn renders_chart_next_to_input_with_pitch_suffix() {
    let temp = tempdir().expect("tempdir should be creatable");
    let chart = write_chart(temp.path(), "song.adofai", &straight_chart_json(4, 100.0));
    let request = RenderRequest {
        reference_sample: Some(reference(temp.path())),
        ..RenderRequest::new(&chart)
    };

    let outcome = Engine::default()
        .render(&request)
        .expect("render should succeed");

    assert_eq!(outcome.output_path, temp.path().join("song_p100.wav"));
    let (sample_rate, channels, samples) =
        read_wav_i16(&outcome.output_path).expect("output should be readable");
    assert_eq!(sample_rate, SAMPLE_RATE);
    assert_eq!(channels, 1);

    // last onset at 2.4s plus one click length
    assert_eq!(samples.len(), 105_840 + 2_000);
    assert_eq!(samples, outcome.track.samples);
    assert_eq!(outcome.report.tile_count, 5);
    assert_eq!(outcome.report.sample_count, samples.len());
    assert_eq!(outcome.report.stretch_factor, 1.0);
}

#[test]
fn pitch_band_changes_click_length() {
    let temp = tempdir().expect("tempdir should be creatable");
    let chart = write_chart(temp.path(), "song.adofai", &straight_chart_json(1, 100.0));
    let request = RenderRequest {
        reference_sample: Some(reference(temp.path())),
        pitch: Some(200),
        ..RenderRequest::new(&chart)
    };

    let outcome = Engine::default()
        .render(&request)
        .expect("render should succeed");

    assert_eq!(outcome.output_path, temp.path().join("song_p200.wav"));
    assert_eq!(outcome.report.stretch_factor, 0.5);
    assert_eq!(outcome.track.samples.len(), 26_460 + 4_000);
}

#[test]
fn stereo_reference_is_downmixed() {
    let temp = tempdir().expect("tempdir should be creatable");
    let chart = write_chart(temp.path(), "song.adofai", &straight_chart_json(1, 100.0));
    let click = synthetic_click(SAMPLE_RATE, 500);
    let interleaved: Vec<f32> = click.iter().flat_map(|sample| [*sample, 0.0]).collect();
    let sample_path = temp.path().join("stereo.wav");
    write_reference_wav(&sample_path, SAMPLE_RATE, 2, &interleaved)
        .expect("stereo wav should be writable");

    let request = RenderRequest {
        reference_sample: Some(sample_path),
        output_path: Some(temp.path().join("out/stereo_click.wav")),
        ..RenderRequest::new(&chart)
    };
    let outcome = Engine::default()
        .render(&request)
        .expect("render should succeed");

    assert_eq!(outcome.track.samples.len(), 26_460 + 500);
    let peak = outcome
        .track
        .samples
        .iter()
        .map(|sample| sample.unsigned_abs())
        .max()
        .unwrap_or_default();
    assert!(peak >= 32_766, "downmixed click should be renormalized to full scale");
}

#[test]
fn empty_chart_renders_zero_samples() {
    let temp = tempdir().expect("tempdir should be creatable");
    let chart = write_chart(temp.path(), "empty.adofai", &straight_chart_json(0, 100.0));
    let request = RenderRequest {
        reference_sample: Some(reference(temp.path())),
        ..RenderRequest::new(&chart)
    };

    let outcome = Engine::default()
        .render(&request)
        .expect("render should succeed");
    let (_, _, samples) = read_wav_i16(&outcome.output_path).expect("output should be readable");
    assert!(samples.is_empty());
}

#[test]
fn frameless_reference_renders_silence_up_to_last_onset() {
    let temp = tempdir().expect("tempdir should be creatable");
    let chart = write_chart(temp.path(), "song.adofai", &straight_chart_json(4, 100.0));
    let sample_path = temp.path().join("silent.wav");
    write_reference_wav(&sample_path, SAMPLE_RATE, 1, &[]).expect("empty wav should be writable");

    let request = RenderRequest {
        reference_sample: Some(sample_path),
        ..RenderRequest::new(&chart)
    };
    let outcome = Engine::default()
        .render(&request)
        .expect("render should succeed");

    let (sample_rate, _, samples) =
        read_wav_i16(&outcome.output_path).expect("output should be readable");
    assert_eq!(sample_rate, SAMPLE_RATE);
    assert_eq!(samples.len(), 105_840);
    assert!(samples.iter().all(|sample| *sample == 0));
    assert_eq!(outcome.report.normalization_gain, 1.0);
}

#[test]
fn dense_chart_is_normalized_without_clipping() {
    let temp = tempdir().expect("tempdir should be creatable");
    // 2000 bpm packs clicks closer than their length, so they stack up
    let chart = write_chart(temp.path(), "dense.adofai", &straight_chart_json(16, 2_000.0));
    let request = RenderRequest {
        reference_sample: Some(reference(temp.path())),
        ..RenderRequest::new(&chart)
    };

    let outcome = Engine::default()
        .render(&request)
        .expect("render should succeed");
    assert!(outcome.report.peak_before_normalization > 1.0);
    assert!(outcome.report.normalization_gain < 1.0);
    let peak = outcome
        .track
        .samples
        .iter()
        .map(|sample| sample.unsigned_abs())
        .max()
        .unwrap_or_default();
    assert_eq!(peak, 32_767);
}

#[test]
fn missing_chart_is_input_not_found() {
    let temp = tempdir().expect("tempdir should be creatable");
    let request = RenderRequest {
        reference_sample: Some(reference(temp.path())),
        ..RenderRequest::new(temp.path().join("missing.adofai"))
    };

    let error = Engine::default()
        .render(&request)
        .expect_err("missing chart should fail");
    assert!(matches!(error, EngineError::InputNotFound { .. }));
}

#[test]
fn malformed_chart_leaves_no_output() {
    let temp = tempdir().expect("tempdir should be creatable");
    let chart = write_chart(temp.path(), "broken.adofai", "{\"settings\": ");
    let request = RenderRequest {
        reference_sample: Some(reference(temp.path())),
        ..RenderRequest::new(&chart)
    };

    let error = Engine::default()
        .render(&request)
        .expect_err("broken chart should fail");
    assert!(matches!(error, EngineError::MalformedChart(_)));
    assert!(!temp.path().join("broken_p100.wav").exists());
}

#[test]
fn config_supplies_reference_and_pitch() {
    let temp = tempdir().expect("tempdir should be creatable");
    let chart = write_chart(temp.path(), "song.adofai", &straight_chart_json(2, 100.0));
    let mut config = AppConfig::default();
    config.audio.reference_sample = reference(temp.path());
    config.audio.default_pitch = 50;

    let outcome = Engine::new(config)
        .render(&RenderRequest::new(&chart))
        .expect("render should succeed");
    assert_eq!(outcome.output_path, temp.path().join("song_p50.wav"));
    assert_eq!(outcome.report.pitch, 50);
    assert_eq!(outcome.report.stretch_factor, 2.0);

    let report_path = temp.path().join("report.json");
    write_render_report(&report_path, &outcome.report).expect("report should be written");
    assert_eq!(
        read_render_report(&report_path).expect("report should be readable"),
        outcome.report
    );
}
