// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use tempfile::TempDir;

use super::*;
use crate::{
    hit::DedopplerHit,
    io::{
        read::{open_filterbank, read_hit_file, sigproc::tests::TestFilterbank},
        write::tmp_path_for,
    },
    search::BruteForceSearch,
};

const NUM_TIMESTEPS: usize = 8;
const COARSE_CHANNEL_SIZE: usize = 128;

/// Deterministic noise in [0, 1).
fn noise(num_timesteps: usize, num_freqs: usize) -> Array2<f32> {
    let mut state: u32 = 12345;
    Array2::from_shape_simple_fn((num_timesteps, num_freqs), || {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
        ((state >> 8) & 0xffff) as f32 / 65536.0
    })
}

fn inject(data: &mut Array2<f32>, channel: usize, drift_steps: i64, value: f32) {
    let denom = (NUM_TIMESTEPS - 1) as i64;
    for t in 0..NUM_TIMESTEPS {
        let col = channel as i64 + drift_steps * t as i64 / denom;
        data[(t, col as usize)] += value;
    }
}

fn get_params(tmp_dir: &TempDir, data: Array2<f32>) -> SeticoreParams {
    let input = tmp_dir.path().join("obs.fil");
    TestFilterbank::new(data).write(&input);

    let reader = open_filterbank(&input).unwrap();
    let mut metadata = reader.get_metadata().clone();
    // Green Bank data that doesn't look like Green Bank data; the coarse
    // channel size has to be given, but the DC spike is still inferred.
    metadata.coarse_channel_size = COARSE_CHANNEL_SIZE;
    metadata.infer_metadata().unwrap();
    metadata.validate().unwrap();
    assert!(metadata.has_dc_spike);

    SeticoreParams {
        reader,
        metadata,
        searcher: Box::new(BruteForceSearch {
            max_drift: 0.1,
            min_snr: 25.0,
        }),
        output: tmp_dir.path().join("obs.hits"),
    }
}

#[test]
fn test_run_finds_and_writes_a_signal() {
    let tmp_dir = TempDir::new().unwrap();
    let mut data = noise(NUM_TIMESTEPS, 2 * COARSE_CHANNEL_SIZE);
    // A signal in the second coarse channel that drifts into the DC spike's
    // neighbour.
    inject(&mut data, COARSE_CHANNEL_SIZE + 60, 3, 50.0);
    let input = data.clone();
    let params = get_params(&tmp_dir, data);
    let max_drift_steps = BruteForceSearch {
        max_drift: 0.1,
        min_snr: 25.0,
    }
    .max_drift_steps(&params.metadata)
    .unwrap();
    assert_eq!(max_drift_steps, 5);

    let num_hits = params.run().unwrap();
    assert!(num_hits >= 1);
    assert!(!tmp_dir.path().join("obs.hits.tmp").exists());

    let records = read_hit_file(&params.output).unwrap();
    assert_eq!(records.len(), num_hits);

    // Nothing in the noise-only coarse channel, and hits are in channel
    // order.
    assert!(records.iter().all(|r| r.signal.coarse_channel == 1));
    assert!(records
        .windows(2)
        .all(|w| w[0].signal.index < w[1].signal.index));

    let best = records
        .iter()
        .max_by(|a, b| a.signal.snr.total_cmp(&b.signal.snr))
        .unwrap();
    assert_eq!(best.signal.index, 60);
    assert_eq!(best.signal.drift_steps, 3);
    assert_eq!(best.signal.beam, 0);
    assert_eq!(best.signal.num_timesteps, NUM_TIMESTEPS);
    assert_abs_diff_eq!(
        best.signal.drift_rate,
        3.0 * params.metadata.drift_rate_resolution()
    );

    let fb = &best.filterbank;
    assert_eq!(fb.start_channel, 20);
    assert_eq!(fb.num_channels, 82);
    assert_eq!(fb.source_name, "Voyager1");
    assert_eq!(fb.telescope_id, 6);
    assert_abs_diff_eq!(
        fb.fch1,
        params.metadata.fch1 + (COARSE_CHANNEL_SIZE + 20) as f64 * params.metadata.foff
    );

    // The window holds the corrected data: the centre channel (64) is the
    // average of its neighbours, and everything else is untouched.
    let offset = COARSE_CHANNEL_SIZE + 20;
    for t in 0..NUM_TIMESTEPS {
        for i in 0..fb.num_channels {
            let expected = if i + 20 == COARSE_CHANNEL_SIZE / 2 {
                (input[(t, offset + i - 1)] + input[(t, offset + i + 1)]) / 2.0
            } else {
                input[(t, offset + i)]
            };
            assert_abs_diff_eq!(fb.data[(t, i)], expected);
        }
    }
}

#[test]
fn test_run_without_hits_makes_an_empty_file() {
    let tmp_dir = TempDir::new().unwrap();
    let params = get_params(&tmp_dir, noise(NUM_TIMESTEPS, 2 * COARSE_CHANNEL_SIZE));
    assert_eq!(params.run().unwrap(), 0);
    assert_eq!(std::fs::metadata(&params.output).unwrap().len(), 0);
}

/// Finds one hit in the first coarse channel, then fails.
struct FailsAfterFirstCoarseChannel;

impl DriftSearch for FailsAfterFirstCoarseChannel {
    fn search(&self, input: &SearchInput) -> Result<Vec<DedopplerHit>, SearchError> {
        if input.coarse_channel > 0 {
            return Err(SearchError::BadDriftRateResolution(0.0));
        }
        Ok(vec![DedopplerHit {
            frequency: input.metadata.fine_channel_freq(input.coarse_channel, 60),
            index: 60,
            drift_steps: 0,
            drift_rate: 0.0,
            snr: 30.0,
            coarse_channel: input.coarse_channel,
            beam: input.beam,
            num_timesteps: input.metadata.num_timesteps,
            power: 30.0,
            incoherent_power: 0.0,
        }])
    }
}

#[test]
fn test_failed_run_doesnt_publish_the_hit_file() {
    let tmp_dir = TempDir::new().unwrap();
    let mut params = get_params(&tmp_dir, noise(NUM_TIMESTEPS, 2 * COARSE_CHANNEL_SIZE));
    params.searcher = Box::new(FailsAfterFirstCoarseChannel);

    let result = params.run();
    assert!(matches!(
        result,
        Err(SeticoreParamsError::Search(
            SearchError::BadDriftRateResolution(_)
        ))
    ));
    assert!(!params.output.exists());
    // The hit from the first coarse channel is only in the temporary file.
    let records = read_hit_file(&tmp_path_for(&params.output)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].signal.coarse_channel, 0);
}
