// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-coarse-channel preprocessing: noise-floor statistics and DC spike
//! removal.
//!
//! This is done in two explicit phases. [`compute_channel_stats`] only ever
//! reads the data, and [`remove_dc_spike`] mutates it. When both are used
//! (see [`preprocess_coarse_channel`]), the statistics are computed from the
//! *uncorrected* data, so the column sum of the centre channel includes the
//! spike.

#[cfg(test)]
mod tests;

use std::ops::Range;

use log::trace;
use ndarray::prelude::*;
use thiserror::Error;

/// Summary statistics of a coarse channel's column sums (the sum of each fine
/// channel over all timesteps).
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    /// The sum over time of each fine channel, in channel order.
    pub column_sums: Vec<f32>,

    pub median: f32,

    /// Mean of the central 90% of the sorted column sums.
    pub mean: f32,

    /// Population standard deviation of the central 90% of the sorted column
    /// sums.
    pub stdev: f32,
}

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("A coarse channel needs at least 3 fine channels to be preprocessed, but this one has {0}")]
    TooFewChannels(usize),

    #[error("A coarse channel needs at least one timestep to be preprocessed")]
    NoTimesteps,
}

/// Compute the statistics of a coarse channel, then interpolate over the DC
/// spike if there is one.
pub fn preprocess_coarse_channel(
    mut data: ArrayViewMut2<f32>,
    has_dc_spike: bool,
) -> Result<ChannelStats, PreprocessError> {
    let stats = compute_channel_stats(data.view())?;
    if has_dc_spike {
        remove_dc_spike(data.view_mut())?;
    }
    Ok(stats)
}

/// `data` has dimensions `[timestep][fine channel]`.
pub fn compute_channel_stats(data: ArrayView2<f32>) -> Result<ChannelStats, PreprocessError> {
    check_shape(data.dim())?;

    let column_sums = data.sum_axis(Axis(0)).to_vec();

    let mut sorted = column_sums.clone();
    sorted.sort_unstable_by(f32::total_cmp);

    let n = sorted.len();
    // The parity of the median index, not of the length, picks the rule.
    let median_index = n / 2;
    let median = if median_index % 2 == 0 {
        sorted[median_index]
    } else {
        (sorted[median_index - 1] + sorted[median_index]) / 2.0
    };

    // Outliers (bright signals, band edges) at either end are excluded.
    let central = &sorted[trimmed_range(n)];
    let num = central.len() as f64;
    let mean = central.iter().map(|&f| f64::from(f)).sum::<f64>() / num;
    let variance = central
        .iter()
        .map(|&f| {
            let diff = f64::from(f) - mean;
            diff * diff
        })
        .sum::<f64>()
        / num;
    let stdev = variance.sqrt();
    trace!("Coarse channel median {median}, mean {mean}, stdev {stdev}");

    Ok(ChannelStats {
        column_sums,
        median,
        mean: mean as f32,
        stdev: stdev as f32,
    })
}

/// Replace the centre fine channel of every timestep with the average of its
/// two neighbours.
pub fn remove_dc_spike(mut data: ArrayViewMut2<f32>) -> Result<(), PreprocessError> {
    check_shape(data.dim())?;

    let centre_channel = data.len_of(Axis(1)) / 2;
    for mut row in data.outer_iter_mut() {
        row[centre_channel] = (row[centre_channel - 1] + row[centre_channel + 1]) / 2.0;
    }
    Ok(())
}

/// The indices of the central 90% of `n` sorted values.
pub(crate) fn trimmed_range(n: usize) -> Range<usize> {
    let begin = (0.05 * n as f64).ceil() as usize;
    let end = ((0.95 * n as f64).floor() as usize + 1).min(n);
    begin..end
}

fn check_shape((num_timesteps, num_channels): (usize, usize)) -> Result<(), PreprocessError> {
    if num_channels < 3 {
        return Err(PreprocessError::TooFewChannels(num_channels));
    }
    if num_timesteps == 0 {
        return Err(PreprocessError::NoTimesteps);
    }
    Ok(())
}
