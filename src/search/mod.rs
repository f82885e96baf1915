// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drift searches: finding narrowband signals that drift linearly in
//! frequency over an observation.

#[cfg(test)]
mod tests;

use log::{debug, trace};
use ndarray::prelude::*;
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    hit::DedopplerHit,
    metadata::{FilterbankMetadata, MetadataError},
    preprocess::ChannelStats,
};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Can't search drift rates with a drift rate resolution of {0} Hz/s")]
    BadDriftRateResolution(f64),

    #[error("Expected coarse channel data with dimensions {expected:?}, but got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Everything a drift search gets to look at for one coarse channel of one
/// beam.
pub struct SearchInput<'a> {
    /// The preprocessed (DC-corrected) data, `[timestep][fine channel]`.
    pub data: ArrayView2<'a, f32>,

    /// The statistics of the data before DC correction.
    pub stats: &'a ChannelStats,

    pub coarse_channel: usize,

    pub beam: usize,

    pub metadata: &'a FilterbankMetadata,
}

impl SearchInput<'_> {
    fn check(&self) -> Result<(), SearchError> {
        self.metadata.check_coarse_channel(self.coarse_channel)?;
        self.metadata.beam(self.beam)?;
        let expected = (
            self.metadata.num_timesteps,
            self.metadata.coarse_channel_size,
        );
        let got = self.data.dim();
        if got != expected {
            return Err(SearchError::ShapeMismatch { expected, got });
        }
        Ok(())
    }
}

pub trait DriftSearch: Send + Sync {
    /// Find hits in a coarse channel. Hits are returned in the order they
    /// should be written.
    fn search(&self, input: &SearchInput) -> Result<Vec<DedopplerHit>, SearchError>;
}

/// Tries every integer drift (in fine channels over the whole observation)
/// from every starting fine channel. This is slow, but simple.
#[derive(Debug, Clone)]
pub struct BruteForceSearch {
    /// The largest drift rate to search for [Hz/s].
    pub max_drift: f64,

    /// The smallest SNR that makes a hit.
    pub min_snr: f32,
}

/// The best drift found from one starting channel.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    drift_steps: i64,
    path_sum: f32,
    snr: f32,
}

impl BruteForceSearch {
    /// The number of fine channels a signal at `max_drift` drifts over the
    /// observation.
    pub fn max_drift_steps(&self, metadata: &FilterbankMetadata) -> Result<i64, SearchError> {
        let resolution = metadata.drift_rate_resolution();
        if !resolution.is_normal() {
            return Err(SearchError::BadDriftRateResolution(resolution));
        }
        Ok((self.max_drift / resolution.abs()).floor() as i64)
    }
}

/// Sum the power along a straight track from `index` at the first timestep
/// to `index + drift_steps` at the last. The track stops at the edge of the
/// coarse channel.
fn path_sum(data: ArrayView2<f32>, index: usize, drift_steps: i64) -> f32 {
    let (num_timesteps, num_channels) = data.dim();
    let denom = num_timesteps.saturating_sub(1).max(1) as i64;
    let mut sum = 0.0;
    for (t, row) in data.outer_iter().enumerate() {
        let col = index as i64 + drift_steps * t as i64 / denom;
        if col < 0 || col >= num_channels as i64 {
            break;
        }
        sum += row[col as usize];
    }
    sum
}

impl DriftSearch for BruteForceSearch {
    fn search(&self, input: &SearchInput) -> Result<Vec<DedopplerHit>, SearchError> {
        input.check()?;
        let metadata = input.metadata;
        let stats = input.stats;
        let max_drift_steps = self.max_drift_steps(metadata)?;
        if stats.stdev <= 0.0 {
            debug!(
                "Coarse channel {} of beam {} has no noise; skipping",
                input.coarse_channel, input.beam
            );
            return Ok(vec![]);
        }
        trace!(
            "Searching coarse channel {} of beam {} with drifts of up to {} steps",
            input.coarse_channel,
            input.beam,
            max_drift_steps
        );

        let data = input.data;
        let mut candidates: Vec<Candidate> = (0..data.len_of(Axis(1)))
            .into_par_iter()
            .filter_map(|index| {
                let mut best: Option<Candidate> = None;
                for drift_steps in -max_drift_steps..=max_drift_steps {
                    let sum = path_sum(data, index, drift_steps);
                    let snr = (sum - stats.mean) / stats.stdev;
                    if best.map_or(true, |b| snr > b.snr) {
                        best = Some(Candidate {
                            index,
                            drift_steps,
                            path_sum: sum,
                            snr,
                        });
                    }
                }
                best.filter(|c| c.snr >= self.min_snr)
            })
            .collect();

        // Strongest first; the strongest hit in a neighbourhood wins.
        candidates.sort_unstable_by(|a, b| b.snr.total_cmp(&a.snr).then(a.index.cmp(&b.index)));
        let neighbourhood = max_drift_steps as usize + 1;
        let mut kept: Vec<Candidate> = vec![];
        for c in candidates {
            if kept
                .iter()
                .all(|k| k.index.abs_diff(c.index) > neighbourhood)
            {
                kept.push(c);
            }
        }
        kept.sort_unstable_by_key(|c| c.index);

        let resolution = metadata.drift_rate_resolution();
        let hits = kept
            .into_iter()
            .map(|c| DedopplerHit {
                frequency: metadata.fine_channel_freq(input.coarse_channel, c.index),
                index: c.index,
                drift_steps: c.drift_steps,
                drift_rate: c.drift_steps as f64 * resolution,
                snr: c.snr,
                coarse_channel: input.coarse_channel,
                beam: input.beam,
                num_timesteps: metadata.num_timesteps,
                power: c.path_sum,
                incoherent_power: 0.0,
            })
            .collect::<Vec<_>>();
        debug!(
            "Found {} hits in coarse channel {} of beam {}",
            hits.len(),
            input.coarse_channel,
            input.beam
        );
        Ok(hits)
    }
}
