// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use super::*;

#[test]
fn test_trimmed_range() {
    assert_eq!(trimmed_range(100), 5..96);
    assert_eq!(trimmed_range(100).len(), 91);
    assert_eq!(trimmed_range(1_048_576), 52429..996148);
    // Tiny inputs mustn't run off the end.
    assert_eq!(trimmed_range(3), 1..3);
}

#[test]
fn test_stats_exclude_outliers() {
    // A single timestep, so the column sums are the values themselves.
    // Channels hold 0..100, except the 5 lowest and 4 highest get huge.
    let mut values: Vec<f32> = (0..100).map(|i| i as f32).collect();
    for v in &mut values[..5] {
        *v = -1e6;
    }
    for v in &mut values[96..] {
        *v = 1e6;
    }
    // Shuffle the channel order deterministically.
    values.rotate_left(37);
    let data = Array2::from_shape_vec((1, 100), values.clone()).unwrap();

    let stats = compute_channel_stats(data.view()).unwrap();
    assert_eq!(stats.column_sums, values);
    // The central values are 5..=95.
    assert_abs_diff_eq!(stats.mean, 50.0);
    assert_abs_diff_eq!(stats.stdev, 690.0_f32.sqrt(), epsilon = 1e-4);
    // 100 channels: the median index (50) is even, so no averaging.
    assert_abs_diff_eq!(stats.median, 50.0);
}

#[test]
fn test_column_sums_accumulate_over_time() {
    let data = Array2::from_shape_fn((4, 10), |(t, c)| (t * 10 + c) as f32);
    let stats = compute_channel_stats(data.view()).unwrap();
    let expected: Vec<f32> = (0..10).map(|c| (60 + 4 * c) as f32).collect();
    assert_eq!(stats.column_sums, expected);
}

#[test]
fn test_median_follows_the_median_index_parity() {
    // Median index 2 is even: the middle value.
    let data = Array2::from_shape_vec((1, 5), vec![9.0, 1.0, 5.0, 3.0, 7.0]).unwrap();
    let stats = compute_channel_stats(data.view()).unwrap();
    assert_abs_diff_eq!(stats.median, 5.0);

    // Median index 2 is even, even though the length isn't odd.
    let data = Array2::from_shape_vec((1, 4), vec![8.0, 2.0, 6.0, 4.0]).unwrap();
    let stats = compute_channel_stats(data.view()).unwrap();
    assert_abs_diff_eq!(stats.median, 6.0);

    // Median index 3 is odd: the average of sorted[2] and sorted[3].
    let data = Array2::from_shape_vec((1, 7), vec![7.0, 1.0, 6.0, 2.0, 5.0, 3.0, 4.0]).unwrap();
    let stats = compute_channel_stats(data.view()).unwrap();
    assert_abs_diff_eq!(stats.median, 3.5);

    let data = Array2::from_shape_vec((1, 6), vec![6.0, 1.0, 5.0, 2.0, 4.0, 3.0]).unwrap();
    let stats = compute_channel_stats(data.view()).unwrap();
    assert_abs_diff_eq!(stats.median, 3.5);
}

#[test]
fn test_remove_dc_spike() {
    let mut data = Array2::from_shape_fn((3, 8), |(t, c)| (t + c) as f32);
    data.column_mut(4).fill(1000.0);
    remove_dc_spike(data.view_mut()).unwrap();
    for t in 0..3 {
        let a = data[(t, 3)];
        let b = data[(t, 5)];
        assert_eq!(data[(t, 4)], (a + b) / 2.0);
    }
    // Nothing else is touched.
    assert_eq!(data[(2, 7)], 9.0);
    assert_eq!(data[(0, 0)], 0.0);
}

#[test]
fn test_remove_dc_spike_odd_width() {
    let mut data = array![[1.0, 2.0, 100.0, 6.0, 5.0]];
    remove_dc_spike(data.view_mut()).unwrap();
    assert_eq!(data, array![[1.0, 2.0, 4.0, 6.0, 5.0]]);
}

#[test]
fn test_stats_see_the_uncorrected_spike() {
    let mut data = Array2::<f32>::ones((2, 100));
    data.column_mut(50).fill(500.0);

    let stats = preprocess_coarse_channel(data.view_mut(), true).unwrap();
    assert_eq!(stats.column_sums[50], 1000.0);
    assert_eq!(stats.column_sums[49], 2.0);
    // The spike sits in the excluded top end, so doesn't affect the
    // statistics.
    assert_abs_diff_eq!(stats.mean, 2.0);
    assert_abs_diff_eq!(stats.stdev, 0.0);
    // But the data has been corrected.
    assert!(data.column(50).iter().all(|&v| v == 1.0));
}

#[test]
fn test_no_dc_spike_leaves_data_alone() {
    let mut data = Array2::<f32>::ones((2, 100));
    data.column_mut(50).fill(500.0);
    let copy = data.clone();
    preprocess_coarse_channel(data.view_mut(), false).unwrap();
    assert_eq!(data, copy);
}

#[test]
fn test_bad_shapes() {
    let data = Array2::<f32>::zeros((4, 2));
    assert!(matches!(
        compute_channel_stats(data.view()),
        Err(PreprocessError::TooFewChannels(2))
    ));

    let mut data = Array2::<f32>::zeros((0, 100));
    assert!(matches!(
        remove_dc_spike(data.view_mut()),
        Err(PreprocessError::NoTimesteps)
    ));
}
