// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to handle writing out hits.
//!
//! Hits are written to a temporary file next to the destination, which is
//! only renamed to the destination by [`HitFileWriter::finish`]. A reader
//! never sees a partially-written hit file at the destination; if the run
//! fails or the process dies before then, only the temporary file remains.

mod error;

pub use error::HitFileWriteError;

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, error, trace, warn};
use ndarray::prelude::*;

use crate::{
    hit::{codec::write_record, DedopplerHit, HitRecord},
    metadata::FilterbankMetadata,
};

/// Get the path of the temporary file used while writing to `path`, i.e.
/// `path` with ".tmp" appended.
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Appends hits and their surrounding filterbank data to a hit file.
pub struct HitFileWriter<'a> {
    metadata: &'a FilterbankMetadata,

    tmp_path: PathBuf,

    /// Where the hit file ends up.
    path: PathBuf,

    /// `None` once finalised.
    file: Option<BufWriter<File>>,

    num_hits: usize,
}

impl<'a> HitFileWriter<'a> {
    /// Open the temporary file for `path`. Any existing temporary file is
    /// truncated.
    pub fn new(
        path: &Path,
        metadata: &'a FilterbankMetadata,
    ) -> Result<HitFileWriter<'a>, HitFileWriteError> {
        let tmp_path = tmp_path_for(path);
        debug!("Writing hits to {}", tmp_path.display());
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|source| HitFileWriteError::Open {
                path: tmp_path.clone(),
                errno: source.raw_os_error(),
                source,
            })?;

        Ok(HitFileWriter {
            metadata,
            tmp_path,
            path: path.to_path_buf(),
            file: Some(BufWriter::new(file)),
            num_hits: 0,
        })
    }

    /// Write `hit` along with the window of `coarse_channel_data` around it.
    /// `coarse_channel_data` is the DC-corrected data of the hit's coarse
    /// channel and beam (dimensions `[timestep][fine channel]`).
    pub fn record_hit(
        &mut self,
        hit: &DedopplerHit,
        coarse_channel_data: ArrayView2<f32>,
    ) -> Result<(), HitFileWriteError> {
        let file = match self.file.as_mut() {
            Some(f) => f,
            None => return Err(HitFileWriteError::Finalised(self.path.clone())),
        };
        let record = HitRecord::extract(hit, coarse_channel_data, self.metadata)?;
        trace!(
            "Writing hit at coarse channel {} index {} ({} channels from {})",
            hit.coarse_channel,
            hit.index,
            record.filterbank.num_channels,
            record.filterbank.start_channel
        );
        write_record(&record, file)?;
        self.num_hits += 1;
        Ok(())
    }

    /// The number of hits written so far.
    pub fn num_hits(&self) -> usize {
        self.num_hits
    }

    /// Close the temporary file and move it to the destination, returning the
    /// destination. This is the only way a hit file reaches its destination.
    pub fn finish(mut self) -> Result<PathBuf, HitFileWriteError> {
        let mut file = match self.file.take() {
            Some(f) => f,
            None => return Err(HitFileWriteError::Finalised(self.path.clone())),
        };
        file.flush()?;
        drop(file);

        std::fs::rename(&self.tmp_path, &self.path).map_err(|source| {
            HitFileWriteError::Rename {
                tmp_path: self.tmp_path.clone(),
                path: self.path.clone(),
                source,
            }
        })?;
        debug!("Wrote {} hits to {}", self.num_hits, self.path.display());
        Ok(self.path.clone())
    }
}

impl Drop for HitFileWriter<'_> {
    /// A writer dropped before [`HitFileWriter::finish`] (e.g. because an
    /// error is propagating) leaves its hits in the temporary file only.
    fn drop(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                error!("Couldn't flush '{}': {e}", self.tmp_path.display());
            }
            warn!(
                "Hit file wasn't finished; {} hits were left in '{}'",
                self.num_hits,
                self.tmp_path.display()
            );
        }
    }
}
