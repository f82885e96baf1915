// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cropping the filterbank data around a hit.

use log::trace;
use ndarray::prelude::*;
use thiserror::Error;

use super::{DedopplerHit, FilterbankWindow, HitRecord};
use crate::{
    constants::{EXTRA_COLUMNS, NO_TELESCOPE_ID},
    metadata::{FilterbankMetadata, MetadataError},
};

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Hit index {index} is outside of a coarse channel with {coarse_channel_size} fine channels")]
    IndexOutOfRange {
        index: usize,
        coarse_channel_size: usize,
    },

    #[error("Expected coarse channel data with dimensions {expected:?}, but got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// The fine channels of a coarse channel that are kept for a hit:
/// `begin..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub begin: usize,
    pub end: usize,
}

impl WindowBounds {
    /// Bound the drift track of a signal starting at `index` and moving
    /// `drift_steps` channels, padded with [`EXTRA_COLUMNS`] on each side and
    /// clipped to the coarse channel. Drift to the left and to the right are
    /// treated the same.
    ///
    /// The end is one less than the padded right edge; existing hit files
    /// are laid out this way, so it is kept.
    ///
    /// `index` must be less than `coarse_channel_size`, and
    /// `coarse_channel_size` must be at least `2 * EXTRA_COLUMNS + 1`.
    pub fn new(index: usize, drift_steps: i64, coarse_channel_size: usize) -> WindowBounds {
        let index = index as i64;
        let final_index = index + drift_steps;
        let leftmost = index.min(final_index);
        let rightmost = index.max(final_index);

        let extra = EXTRA_COLUMNS as i64;
        let begin = (leftmost - extra).max(0);
        let end = (rightmost + extra).min(coarse_channel_size as i64) - 1;

        WindowBounds {
            begin: begin as usize,
            end: end.max(begin) as usize,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.end - self.begin
    }
}

impl HitRecord {
    /// Crop the hit's drift track out of its coarse channel and attach the
    /// observation's metadata.
    ///
    /// `coarse_channel_data` has dimensions `[timestep][fine channel]`, and
    /// must be the data for the hit's coarse channel and beam. The returned
    /// window is a fresh copy.
    pub fn extract(
        hit: &DedopplerHit,
        coarse_channel_data: ArrayView2<f32>,
        metadata: &FilterbankMetadata,
    ) -> Result<HitRecord, WindowError> {
        metadata.check_coarse_channel(hit.coarse_channel)?;
        let beam = metadata.beam(hit.beam)?;

        let expected = (metadata.num_timesteps, metadata.coarse_channel_size);
        let got = coarse_channel_data.dim();
        if got != expected {
            return Err(WindowError::ShapeMismatch { expected, got });
        }
        if hit.index >= metadata.coarse_channel_size {
            return Err(WindowError::IndexOutOfRange {
                index: hit.index,
                coarse_channel_size: metadata.coarse_channel_size,
            });
        }

        let bounds = WindowBounds::new(hit.index, hit.drift_steps, metadata.coarse_channel_size);
        trace!(
            "Hit at index {} with drift {} gets window {:?}",
            hit.index,
            hit.drift_steps,
            bounds
        );
        let data = coarse_channel_data
            .slice(s![.., bounds.begin..bounds.end])
            .as_standard_layout()
            .into_owned();

        Ok(HitRecord {
            signal: hit.clone(),
            filterbank: FilterbankWindow {
                source_name: beam.source_name.clone(),
                fch1: metadata.fine_channel_freq(hit.coarse_channel, bounds.begin),
                foff: metadata.foff,
                tstart: metadata.tstart,
                tsamp: metadata.tsamp,
                ra: beam.ra,
                dec: beam.dec,
                telescope_id: metadata
                    .telescope
                    .map(|t| t.sigproc_id())
                    .unwrap_or(NO_TELESCOPE_ID),
                num_timesteps: metadata.num_timesteps,
                num_channels: bounds.num_channels(),
                data,
                coarse_channel: hit.coarse_channel,
                start_channel: bounds.begin,
                beam: hit.beam,
            },
        })
    }
}
