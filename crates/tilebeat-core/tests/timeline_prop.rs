use proptest::prelude::*;
use tilebeat_core::{
    TimelineDefaults, build_timeline,
    model::{MIDSPIN_ANGLE, TempoChange, TileSpec},
    resample::pitch_shift,
};

fn tile_spec() -> impl Strategy<Value = TileSpec> {
    let angle = prop_oneof![
        9 => (0_u32..24).prop_map(|step| f64::from(step) * 15.0),
        1 => Just(MIDSPIN_ANGLE),
    ];
    let tempo = prop_oneof![
        3 => Just(TempoChange::Inherit),
        1 => (30.0_f64..400.0).prop_map(TempoChange::Absolute),
        1 => (0.25_f64..4.0).prop_map(TempoChange::Multiplier),
    ];
    let volume = prop::option::of(0.0_f64..150.0);

    (angle, tempo, any::<bool>(), 0.0_f64..4.0, volume).prop_map(
        |(angle, tempo, twirl, pause_beats, volume)| TileSpec {
            angle,
            tempo,
            // a transition wider than the turn itself can blend to a negative tempo
            transition_angle: None,
            twirl,
            pause_beats,
            hold: false,
            volume,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn offsets_never_decrease(bpm in 30.0_f64..300.0, tiles in prop::collection::vec(tile_spec(), 0..64)) {
        let mut specs = vec![TileSpec::start(bpm, None)];
        for spec in tiles {
            // back-to-back midspins walk the angle out of the range a chart can describe
            let follows_midspin = specs.last().is_some_and(|last| last.angle == MIDSPIN_ANGLE);
            let angle = if follows_midspin && spec.angle == MIDSPIN_ANGLE { 0.0 } else { spec.angle };
            specs.push(TileSpec { angle, ..spec });
        }
        let resolved = build_timeline(&specs, &TimelineDefaults::default());

        prop_assert_eq!(resolved.len(), specs.len());
        for pair in resolved.windows(2) {
            prop_assert!(pair[1].time_offset >= pair[0].time_offset);
            prop_assert!(pair[1].beat_count >= pair[0].beat_count);
            prop_assert!(pair[1].effective_tempo > 0.0);
        }
    }

    #[test]
    fn inherited_tempo_carries_over(bpm in 30.0_f64..300.0, angles in prop::collection::vec(0_u32..24, 1..32)) {
        let mut specs = vec![TileSpec::start(bpm, None)];
        specs.extend(angles.into_iter().map(|step| TileSpec::at_angle(f64::from(step) * 15.0)));
        let resolved = build_timeline(&specs, &TimelineDefaults::default());

        for pair in resolved.windows(2) {
            prop_assert_eq!(pair[1].effective_tempo, pair[0].effective_tempo);
        }
    }

    #[test]
    fn non_midspin_turns_always_advance(steps in prop::collection::vec(0_u32..24, 1..32), twirls in prop::collection::vec(any::<bool>(), 32)) {
        let mut specs = vec![TileSpec::start(100.0, None)];
        specs.extend(steps.iter().zip(&twirls).map(|(step, twirl)| TileSpec {
            twirl: *twirl,
            ..TileSpec::at_angle(f64::from(*step) * 15.0)
        }));
        let resolved = build_timeline(&specs, &TimelineDefaults::default());

        for pair in resolved.windows(2) {
            prop_assert!(pair[1].beat_count > pair[0].beat_count);
        }
    }

    #[test]
    fn resampled_length_is_floor_of_ratio(len in 1_usize..2048, band in prop::sample::select(vec![0.25_f64, 0.5, 2.0, 4.0])) {
        let input: Vec<f32> = (0..len).map(|index| (index % 7) as f32 / 7.0).collect();
        let output = pitch_shift(&input, band);
        let expected = (len as f64 / band).floor() as usize;
        prop_assert_eq!(output.len(), expected);
    }
}
