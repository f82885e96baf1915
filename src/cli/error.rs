// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all seticore-related errors. This should be the *only*
//! error enum that is publicly visible from the command-line interface.

use thiserror::Error;

use super::args::SeticoreArgsError;
use crate::{
    hit::WindowError,
    io::{
        read::{FilterbankReadError, HitFileReadError},
        write::HitFileWriteError,
    },
    metadata::MetadataError,
    params::SeticoreParamsError,
    preprocess::PreprocessError,
    search::SearchError,
};

/// The *only* publicly visible error from the seticore binary.
#[derive(Error, Debug)]
pub enum SeticoreError {
    /// An error related to working out the layout of the data.
    #[error("{0}")]
    Metadata(String),

    /// An error related to reading filterbank data.
    #[error("{0}")]
    FilterbankRead(String),

    /// An error related to reading or writing hit files.
    #[error("{0}")]
    HitFile(String),

    /// An error related to searching for hits.
    #[error("{0}")]
    Search(String),

    /// An error related to argument files.
    #[error("{0}")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<SeticoreArgsError> for SeticoreError {
    fn from(e: SeticoreArgsError) -> Self {
        let s = e.to_string();
        match e {
            SeticoreArgsError::NoInput
            | SeticoreArgsError::ZeroCoarseChannelSize
            | SeticoreArgsError::BadMaxDrift(_)
            | SeticoreArgsError::BadMinSnr(_)
            | SeticoreArgsError::OutputIsInput(_) => Self::Generic(s),
        }
    }
}

impl From<SeticoreParamsError> for SeticoreError {
    fn from(e: SeticoreParamsError) -> Self {
        match e {
            SeticoreParamsError::Read(e) => Self::from(e),
            SeticoreParamsError::Preprocess(e) => Self::from(e),
            SeticoreParamsError::Search(e) => Self::from(e),
            SeticoreParamsError::Write(e) => Self::from(e),
        }
    }
}

impl From<MetadataError> for SeticoreError {
    fn from(e: MetadataError) -> Self {
        let s = e.to_string();
        match e {
            MetadataError::CannotInfer { .. }
            | MetadataError::NotDivisible { .. }
            | MetadataError::CoarseChannelTooSmall(_) => Self::Metadata(format!(
                "{s}\n\nIf the channelisation can't be inferred, try specifying --coarse-channel-size."
            )),
            MetadataError::TelescopeMismatch { .. }
            | MetadataError::CoarseChannelSizeUnknown
            | MetadataError::NoTimesteps
            | MetadataError::NoBeams
            | MetadataError::BeamOutOfRange { .. }
            | MetadataError::CoarseChannelOutOfRange { .. } => Self::Metadata(s),
        }
    }
}

impl From<FilterbankReadError> for SeticoreError {
    fn from(e: FilterbankReadError) -> Self {
        let s = e.to_string();
        match e {
            FilterbankReadError::IO(e) => Self::from(e),
            _ => Self::FilterbankRead(s),
        }
    }
}

impl From<PreprocessError> for SeticoreError {
    fn from(e: PreprocessError) -> Self {
        Self::Search(e.to_string())
    }
}

impl From<SearchError> for SeticoreError {
    fn from(e: SearchError) -> Self {
        let s = e.to_string();
        match e {
            SearchError::Metadata(e) => Self::from(e),
            SearchError::BadDriftRateResolution(_) | SearchError::ShapeMismatch { .. } => {
                Self::Search(s)
            }
        }
    }
}

impl From<WindowError> for SeticoreError {
    fn from(e: WindowError) -> Self {
        Self::HitFile(e.to_string())
    }
}

impl From<HitFileWriteError> for SeticoreError {
    fn from(e: HitFileWriteError) -> Self {
        Self::HitFile(e.to_string())
    }
}

impl From<HitFileReadError> for SeticoreError {
    fn from(e: HitFileReadError) -> Self {
        Self::HitFile(e.to_string())
    }
}

impl From<std::io::Error> for SeticoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
