// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hits: candidate drifting narrowband signals, and the windows of
//! filterbank data written out alongside them.

pub(crate) mod codec;
mod window;

pub use codec::HitCodecError;
pub use window::{WindowBounds, WindowError};

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

/// One candidate detection from a drift search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedopplerHit {
    /// The absolute frequency of the signal at the start of the observation.
    pub frequency: f64,

    /// The fine channel of the signal within its coarse channel, at the
    /// first timestep.
    pub index: usize,

    /// How many fine channels the signal moves over the whole observation.
    /// May be negative.
    pub drift_steps: i64,

    /// [Hz/s]
    pub drift_rate: f64,

    pub snr: f32,

    pub coarse_channel: usize,

    pub beam: usize,

    pub num_timesteps: usize,

    /// Power summed along the drift track.
    pub power: f32,

    /// Power summed along the drift track in the incoherent beam, if there
    /// is one.
    pub incoherent_power: f32,
}

impl DedopplerHit {
    /// The fine channel the signal is expected to reach by the end of the
    /// observation. This can be off either edge of the coarse channel.
    pub fn final_index(&self) -> i64 {
        self.index as i64 + self.drift_steps
    }
}

/// A cropped piece of a coarse channel around a hit, with enough metadata
/// attached to place it in frequency, time and on the sky.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterbankWindow {
    pub source_name: String,

    /// The frequency of the first channel *of this window*.
    pub fch1: f64,
    pub foff: f64,
    pub tstart: f64,
    pub tsamp: f64,
    pub ra: f64,
    pub dec: f64,

    /// sigproc telescope ID, or -1 if unknown.
    pub telescope_id: i32,

    pub num_timesteps: usize,
    pub num_channels: usize,

    /// Power with dimensions `[timestep][channel]`.
    pub data: Array2<f32>,

    pub coarse_channel: usize,

    /// The fine channel within the coarse channel that this window starts
    /// at.
    pub start_channel: usize,

    pub beam: usize,
}

/// Everything persisted about a single hit. Each of these is written out as
/// a self-contained record.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub signal: DedopplerHit,
    pub filterbank: FilterbankWindow,
}
