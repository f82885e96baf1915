// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading sigproc filterbank files.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SigprocReadError {
    #[error("Expected the file to start with HEADER_START, but got '{0}'")]
    NoHeaderStart(String),

    #[error("Found a sigproc header string with an unreasonable length ({0})")]
    BadStringLength(i32),

    #[error("Unknown sigproc header keyword '{0}'")]
    UnknownKeyword(String),

    #[error("The sigproc header is missing '{0}'")]
    MissingKey(&'static str),

    #[error("The data has {0} bits per sample, but only 32-bit floats are supported")]
    UnsupportedNbits(i32),

    #[error("The data has {0} IFs, but only 1 is supported")]
    UnsupportedNifs(i32),

    #[error("The sigproc header says there are {0} channels")]
    BadNchans(i32),

    #[error("The file has {data_len} bytes of data, which isn't a whole number of {timestep_len}-byte timesteps")]
    PartialTimestep { data_len: u64, timestep_len: u64 },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
