// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for a seticore run.
//!
//! The code here is kind of "mirroring" the code within the `cli` module; the
//! idea is that `cli` is unparsed, user-facing code, whereas parameters have
//! been parsed and are ready to be used directly.

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};
use ndarray::prelude::*;
use thiserror::Error;

use crate::{
    io::{
        read::{FilterbankRead, FilterbankReadError},
        write::{HitFileWriteError, HitFileWriter},
    },
    metadata::FilterbankMetadata,
    preprocess::{preprocess_coarse_channel, PreprocessError},
    search::{DriftSearch, SearchError, SearchInput},
    PROGRESS_BARS,
};

#[derive(Error, Debug)]
pub enum SeticoreParamsError {
    #[error(transparent)]
    Read(#[from] FilterbankReadError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Write(#[from] HitFileWriteError),
}

pub struct SeticoreParams {
    pub reader: Box<dyn FilterbankRead>,

    /// The reader's metadata, after any user overrides, inference and
    /// validation.
    pub metadata: FilterbankMetadata,

    pub searcher: Box<dyn DriftSearch>,

    /// Where the hits get written.
    pub output: PathBuf,
}

impl SeticoreParams {
    /// Search every coarse channel of every beam, writing all hits to the
    /// output file. Coarse channels are done in ascending order, and their
    /// hits are written in the order the search produces them.
    ///
    /// Returns the number of hits written.
    pub fn run(&self) -> Result<usize, SeticoreParamsError> {
        let metadata = &self.metadata;
        let num_beams = metadata.beams.len();
        let num_coarse_channels = metadata.num_coarse_channels;
        info!(
            "Drift rate resolution: {} Hz/s",
            metadata.drift_rate_resolution()
        );

        let mut writer = HitFileWriter::new(&self.output, metadata)?;

        let pb = ProgressBar::with_draw_target(
            Some((num_beams * num_coarse_channels) as _),
            if PROGRESS_BARS.load() {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:17}: [{wide_bar:.blue}] {pos:3}/{len:3} coarse channels ({elapsed_precise}<{eta_precise})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        )
        .with_position(0)
        .with_message("Searching");
        pb.tick();

        // The same buffer is used for every coarse channel.
        let mut data_tf = Array2::zeros((metadata.num_timesteps, metadata.coarse_channel_size));
        for beam in 0..num_beams {
            for coarse_channel in 0..num_coarse_channels {
                self.reader
                    .read_coarse_channel(data_tf.view_mut(), beam, coarse_channel)?;
                let stats = preprocess_coarse_channel(data_tf.view_mut(), metadata.has_dc_spike)?;
                debug!(
                    "Beam {beam} coarse channel {coarse_channel}: median {}, mean {}, stdev {}",
                    stats.median, stats.mean, stats.stdev
                );

                let hits = self.searcher.search(&SearchInput {
                    data: data_tf.view(),
                    stats: &stats,
                    coarse_channel,
                    beam,
                    metadata,
                })?;
                for hit in &hits {
                    writer.record_hit(hit, data_tf.view())?;
                }
                pb.inc(1);
            }
        }
        pb.abandon_with_message("Finished searching");

        let num_hits = writer.num_hits();
        let output = writer.finish()?;
        info!("Wrote {num_hits} hits to {}", output.display());
        Ok(num_hits)
    }
}
