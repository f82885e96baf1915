// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from inferring and validating filterbank metadata.

use thiserror::Error;

use super::Telescope;
use crate::constants::MIN_COARSE_CHANNEL_SIZE;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Unable to infer the coarse channel size for data with dimensions: {num_timesteps} x {num_freqs}. Please set the coarse channel size (the nfpc header) explicitly")]
    CannotInfer {
        num_timesteps: usize,
        num_freqs: usize,
    },

    #[error("Data with dimensions {num_timesteps} x {num_freqs} looks like it came from {expected}, but the telescope ID says it came from {actual}")]
    TelescopeMismatch {
        expected: Telescope,
        actual: Telescope,
        num_timesteps: usize,
        num_freqs: usize,
    },

    #[error("The total number of fine channels ({num_freqs}) is not a multiple of the coarse channel size ({coarse_channel_size})")]
    NotDivisible {
        num_freqs: usize,
        coarse_channel_size: usize,
    },

    #[error("The coarse channel size hasn't been set or inferred")]
    CoarseChannelSizeUnknown,

    #[error("A coarse channel size of {0} is too small; at least {MIN_COARSE_CHANNEL_SIZE} fine channels are required")]
    CoarseChannelTooSmall(usize),

    #[error("The data has no timesteps")]
    NoTimesteps,

    #[error("No beams are described by the metadata")]
    NoBeams,

    #[error("Beam index {beam} is out of range; there are {num_beams} beams")]
    BeamOutOfRange { beam: usize, num_beams: usize },

    #[error("Coarse channel index {coarse_channel} is out of range; there are {num_coarse_channels} coarse channels")]
    CoarseChannelOutOfRange {
        coarse_channel: usize,
        num_coarse_channels: usize,
    },
}
