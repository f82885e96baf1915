// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading filterbank data.

use std::path::PathBuf;

use thiserror::Error;

use super::FILTERBANK_INPUT_EXTENSIONS;

#[derive(Error, Debug)]
pub enum FilterbankReadError {
    #[error("Filterbank file '{}' doesn't exist", .0.display())]
    DoesntExist(PathBuf),

    #[error("Filterbank file '{}' has an unsupported extension; supported extensions are: {}", .0.display(), *FILTERBANK_INPUT_EXTENSIONS)]
    UnsupportedExtension(PathBuf),

    #[error("'{}' is an HDF5 file, but seticore was compiled without the \"hdf5\" feature", .0.display())]
    NoHdf5Support(PathBuf),

    #[error("Beam index {beam} is out of range; there are {num_beams} beams")]
    BeamOutOfRange { beam: usize, num_beams: usize },

    #[error("Can't read fine channels {begin}..{end}; there are only {num_freqs} fine channels")]
    ChannelsOutOfRange {
        begin: usize,
        end: usize,
        num_freqs: usize,
    },

    #[error("Expected an array with {expected} timesteps, but got {got}")]
    BadArrayShape { expected: usize, got: usize },

    #[error(transparent)]
    Sigproc(#[from] super::sigproc::SigprocReadError),

    #[cfg(feature = "hdf5")]
    #[error(transparent)]
    H5(#[from] super::h5::H5ReadError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
