// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hit extraction for radio-telescope filterbank data.
//!
//! Filterbank data (`[timestep][fine channel]` power) is split into coarse
//! channels, each of which is normalised, searched for narrowband signals
//! that drift linearly in frequency, and the hits written to a hit file
//! along with the data around them.

mod cli;
pub mod constants;
pub mod hit;
pub mod io;
pub mod metadata;
pub mod params;
pub mod preprocess;
pub mod search;

use crossbeam_utils::atomic::AtomicCell;

// Re-exports.
pub use cli::{Seticore, SeticoreError};
pub use hit::{DedopplerHit, FilterbankWindow, HitRecord};
pub use io::{
    read::{open_filterbank, read_hit_file, FilterbankRead, HitFileReader},
    write::HitFileWriter,
};
pub use metadata::{BeamInfo, FilterbankMetadata, MetadataError, Telescope};
pub use preprocess::ChannelStats;
pub use search::{BruteForceSearch, DriftSearch};

/// Should we draw progress bars? This is set by the CLI.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
