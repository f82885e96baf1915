// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to handle reading filterbank data and hit files.

mod error;
#[cfg(feature = "hdf5")]
mod h5;
mod hits;
pub(crate) mod sigproc;

pub use error::FilterbankReadError;
#[cfg(feature = "hdf5")]
pub use h5::{H5ReadError, H5Reader};
pub use hits::{read_hit_file, HitFileReadError, HitFileReader};
pub use sigproc::{SigprocReadError, SigprocReader};

use std::path::Path;

use itertools::Itertools;
use log::debug;
use ndarray::prelude::*;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::metadata::FilterbankMetadata;

/// All supported filterbank formats.
#[derive(Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum FilterbankInputType {
    #[strum(serialize = "fil")]
    Sigproc,

    #[strum(serialize = "h5")]
    H5,
}

lazy_static::lazy_static! {
    pub(crate) static ref FILTERBANK_INPUT_EXTENSIONS: String = FilterbankInputType::iter().join(", ");
}

pub trait FilterbankRead: Send + Sync {
    /// Metadata from the file's header. Channelisation details may not have
    /// been inferred yet.
    fn get_metadata(&self) -> &FilterbankMetadata;

    fn get_input_data_type(&self) -> FilterbankInputType;

    /// Read the fine channels of one coarse channel for every timestep into
    /// `data_tf`, which has dimensions `[timestep][fine channel]`. The coarse
    /// channel size is taken from the number of columns in `data_tf`.
    fn read_coarse_channel(
        &self,
        data_tf: ArrayViewMut2<f32>,
        beam: usize,
        coarse_channel: usize,
    ) -> Result<(), FilterbankReadError>;
}

/// Open a filterbank file, choosing a reader from its extension.
pub fn open_filterbank(file: &Path) -> Result<Box<dyn FilterbankRead>, FilterbankReadError> {
    if !file.exists() {
        return Err(FilterbankReadError::DoesntExist(file.to_path_buf()));
    }

    let input_type = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .and_then(|e| match e.as_str() {
            "hdf5" => Some(FilterbankInputType::H5),
            e => e.parse().ok(),
        });
    debug!("Input file {} has type {:?}", file.display(), input_type);

    match input_type {
        Some(FilterbankInputType::Sigproc) => Ok(Box::new(SigprocReader::new(file)?)),

        #[cfg(feature = "hdf5")]
        Some(FilterbankInputType::H5) => Ok(Box::new(H5Reader::new(file)?)),

        #[cfg(not(feature = "hdf5"))]
        Some(FilterbankInputType::H5) => Err(FilterbankReadError::NoHdf5Support(file.to_path_buf())),

        None => Err(FilterbankReadError::UnsupportedExtension(
            file.to_path_buf(),
        )),
    }
}

/// Check that a coarse channel can be read into `data_tf` from data with the
/// given metadata, returning the range of fine channels to read.
fn coarse_channel_range(
    metadata: &FilterbankMetadata,
    data_tf: &ArrayViewMut2<f32>,
    beam: usize,
    coarse_channel: usize,
) -> Result<std::ops::Range<usize>, FilterbankReadError> {
    let num_beams = metadata.beams.len();
    if beam >= num_beams {
        return Err(FilterbankReadError::BeamOutOfRange { beam, num_beams });
    }
    let (num_timesteps, coarse_channel_size) = data_tf.dim();
    if num_timesteps != metadata.num_timesteps {
        return Err(FilterbankReadError::BadArrayShape {
            expected: metadata.num_timesteps,
            got: num_timesteps,
        });
    }
    let begin = coarse_channel * coarse_channel_size;
    let end = begin + coarse_channel_size;
    if end > metadata.num_freqs {
        return Err(FilterbankReadError::ChannelsOutOfRange {
            begin,
            end,
            num_freqs: metadata.num_freqs,
        });
    }
    Ok(begin..end)
}
