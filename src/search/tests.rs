// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use super::*;
use crate::metadata::BeamInfo;

const NUM_TIMESTEPS: usize = 8;
const COARSE_CHANNEL_SIZE: usize = 100;

fn get_metadata() -> FilterbankMetadata {
    FilterbankMetadata {
        telescope: None,
        num_timesteps: NUM_TIMESTEPS,
        num_freqs: 2 * COARSE_CHANNEL_SIZE,
        coarse_channel_size: COARSE_CHANNEL_SIZE,
        num_coarse_channels: 2,
        has_dc_spike: false,
        fch1: 1000.0,
        // 1 Hz channels.
        foff: 1e-6,
        tstart: 0.0,
        tsamp: 1.0,
        beams: vec![BeamInfo::default()],
    }
}

/// Noise-free statistics, so that a path's SNR is its sum.
fn unit_stats() -> ChannelStats {
    ChannelStats {
        column_sums: vec![0.0; COARSE_CHANNEL_SIZE],
        median: 0.0,
        mean: 0.0,
        stdev: 1.0,
    }
}

/// Put `value` in every timestep along a drift track.
fn inject(data: &mut Array2<f32>, index: usize, drift_steps: i64, value: f32) {
    let denom = (NUM_TIMESTEPS - 1) as i64;
    for t in 0..NUM_TIMESTEPS {
        let col = index as i64 + drift_steps * t as i64 / denom;
        data[(t, col as usize)] += value;
    }
}

fn search(data: &Array2<f32>, coarse_channel: usize) -> Vec<DedopplerHit> {
    let metadata = get_metadata();
    let stats = unit_stats();
    let searcher = BruteForceSearch {
        // 8 drift steps.
        max_drift: 1.0,
        min_snr: 25.0,
    };
    searcher
        .search(&SearchInput {
            data: data.view(),
            stats: &stats,
            coarse_channel,
            beam: 0,
            metadata: &metadata,
        })
        .unwrap()
}

#[test]
fn test_max_drift_steps() {
    let metadata = get_metadata();
    assert_abs_diff_eq!(metadata.drift_rate_resolution(), 0.125);
    let searcher = BruteForceSearch {
        max_drift: 1.0,
        min_snr: 25.0,
    };
    assert_eq!(searcher.max_drift_steps(&metadata).unwrap(), 8);

    let mut metadata = get_metadata();
    metadata.foff = -1e-6;
    assert_eq!(searcher.max_drift_steps(&metadata).unwrap(), 8);

    metadata.foff = 0.0;
    assert!(matches!(
        searcher.max_drift_steps(&metadata),
        Err(SearchError::BadDriftRateResolution(_))
    ));
}

#[test]
fn test_path_sum_stops_at_the_edge() {
    let data = Array2::ones((NUM_TIMESTEPS, COARSE_CHANNEL_SIZE));
    assert_abs_diff_eq!(path_sum(data.view(), 50, 8), 8.0);
    // Columns 98, 99, then off the edge.
    assert_abs_diff_eq!(path_sum(data.view(), 98, 8), 2.0);
    assert_abs_diff_eq!(path_sum(data.view(), 0, -1), 7.0);
}

#[test]
fn test_finds_a_drifting_signal() {
    let mut data = Array2::zeros((NUM_TIMESTEPS, COARSE_CHANNEL_SIZE));
    inject(&mut data, 30, 4, 10.0);

    let hits = search(&data, 1);
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.index, 30);
    assert_eq!(hit.drift_steps, 4);
    assert_abs_diff_eq!(hit.drift_rate, 0.5);
    assert_abs_diff_eq!(hit.snr, 80.0);
    assert_abs_diff_eq!(hit.power, 80.0);
    assert_abs_diff_eq!(hit.incoherent_power, 0.0);
    assert_eq!(hit.coarse_channel, 1);
    assert_eq!(hit.beam, 0);
    assert_eq!(hit.num_timesteps, NUM_TIMESTEPS);
    assert_abs_diff_eq!(hit.frequency, 1000.0 + 130.0 * 1e-6, epsilon = 1e-9);
}

#[test]
fn test_hits_are_in_channel_order() {
    let mut data = Array2::zeros((NUM_TIMESTEPS, COARSE_CHANNEL_SIZE));
    inject(&mut data, 70, -5, 20.0);
    inject(&mut data, 20, 0, 5.0);

    let hits = search(&data, 0);
    assert_eq!(
        hits.iter()
            .map(|h| (h.index, h.drift_steps))
            .collect::<Vec<_>>(),
        vec![(20, 0), (70, -5)]
    );
    assert_abs_diff_eq!(hits[1].drift_rate, -0.625);
}

#[test]
fn test_weak_signals_arent_hits() {
    let mut data = Array2::zeros((NUM_TIMESTEPS, COARSE_CHANNEL_SIZE));
    inject(&mut data, 50, 2, 3.0);
    assert!(search(&data, 0).is_empty());
}

#[test]
fn test_no_noise_means_no_hits() {
    let metadata = get_metadata();
    let data = Array2::from_elem((NUM_TIMESTEPS, COARSE_CHANNEL_SIZE), 1.0);
    let stats = ChannelStats {
        stdev: 0.0,
        ..unit_stats()
    };
    let hits = BruteForceSearch {
        max_drift: 1.0,
        min_snr: 25.0,
    }
    .search(&SearchInput {
        data: data.view(),
        stats: &stats,
        coarse_channel: 0,
        beam: 0,
        metadata: &metadata,
    })
    .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn test_bad_input() {
    let metadata = get_metadata();
    let stats = unit_stats();
    let searcher = BruteForceSearch {
        max_drift: 1.0,
        min_snr: 25.0,
    };

    let data = Array2::zeros((NUM_TIMESTEPS, COARSE_CHANNEL_SIZE / 2));
    assert!(matches!(
        searcher.search(&SearchInput {
            data: data.view(),
            stats: &stats,
            coarse_channel: 0,
            beam: 0,
            metadata: &metadata,
        }),
        Err(SearchError::ShapeMismatch { .. })
    ));

    let data = Array2::zeros((NUM_TIMESTEPS, COARSE_CHANNEL_SIZE));
    assert!(matches!(
        searcher.search(&SearchInput {
            data: data.view(),
            stats: &stats,
            coarse_channel: 2,
            beam: 0,
            metadata: &metadata,
        }),
        Err(SearchError::Metadata(_))
    ));
    assert!(matches!(
        searcher.search(&SearchInput {
            data: data.view(),
            stats: &stats,
            coarse_channel: 0,
            beam: 1,
            metadata: &metadata,
        }),
        Err(SearchError::Metadata(_))
    ));
}
