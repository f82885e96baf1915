// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Observation metadata, and the heuristics used to fill in channelisation
//! details that weren't supplied with the data.

mod error;

pub use error::MetadataError;

use std::fmt::Display;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::constants::*;

/// The telescopes we know something about. These map onto sigproc
/// telescope IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Telescope {
    Parkes,
    GreenBank,
    Ata,
    MeerKat,
    Other(i32),
}

impl Telescope {
    /// Convert a sigproc telescope ID. Negative IDs mean "unknown".
    pub fn from_sigproc_id(id: i32) -> Option<Telescope> {
        match id {
            i32::MIN..=-1 => None,
            PARKES_TELESCOPE_ID => Some(Telescope::Parkes),
            GREEN_BANK_TELESCOPE_ID => Some(Telescope::GreenBank),
            ATA_TELESCOPE_ID => Some(Telescope::Ata),
            MEERKAT_TELESCOPE_ID => Some(Telescope::MeerKat),
            other => Some(Telescope::Other(other)),
        }
    }

    pub fn sigproc_id(self) -> i32 {
        match self {
            Telescope::Parkes => PARKES_TELESCOPE_ID,
            Telescope::GreenBank => GREEN_BANK_TELESCOPE_ID,
            Telescope::Ata => ATA_TELESCOPE_ID,
            Telescope::MeerKat => MEERKAT_TELESCOPE_ID,
            Telescope::Other(id) => id,
        }
    }
}

impl Display for Telescope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Telescope::Parkes => write!(f, "Parkes"),
            Telescope::GreenBank => write!(f, "Green Bank"),
            Telescope::Ata => write!(f, "the ATA"),
            Telescope::MeerKat => write!(f, "MeerKAT"),
            Telescope::Other(id) => write!(f, "telescope ID {id}"),
        }
    }
}

/// What a beam was pointed at.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BeamInfo {
    pub source_name: String,

    /// Right ascension [hours].
    pub ra: f64,

    /// Declination [degrees].
    pub dec: f64,
}

/// The geometry of one observation. This is built from file headers (or
/// user-supplied values), [`FilterbankMetadata::infer_metadata`] is run
/// once, and from then on it is only ever read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterbankMetadata {
    /// `None` if the data doesn't say where it came from.
    pub telescope: Option<Telescope>,

    /// The number of time samples (rows).
    pub num_timesteps: usize,

    /// The total number of fine channels across the whole band (columns).
    pub num_freqs: usize,

    /// The number of fine channels in a coarse channel. 0 means "not yet
    /// known".
    pub coarse_channel_size: usize,

    /// `num_freqs / coarse_channel_size`. Only meaningful after inference.
    pub num_coarse_channels: usize,

    /// Whether the centre fine channel of each coarse channel is an
    /// instrumental spike that needs to be interpolated over.
    pub has_dc_spike: bool,

    /// The frequency of the first fine channel.
    pub fch1: f64,

    /// The frequency step between fine channels (same units as `fch1`).
    pub foff: f64,

    /// The start of the observation [MJD].
    pub tstart: f64,

    /// The duration of a timestep [seconds].
    pub tsamp: f64,

    /// Per-beam pointing information, indexed by beam number.
    pub beams: Vec<BeamInfo>,
}

impl FilterbankMetadata {
    /// Guess the coarse channel size, whether there's a DC spike and the
    /// number of coarse channels from the array dimensions and whatever
    /// else was already set.
    ///
    /// Nothing is modified if an error is returned.
    pub fn infer_metadata(&mut self) -> Result<(), MetadataError> {
        let num_timesteps = self.num_timesteps;
        let num_freqs = self.num_freqs;
        let check_telescope = |expected: Telescope| match self.telescope {
            None => Ok(()),
            Some(t) if t == expected => Ok(()),
            Some(actual) => Err(MetadataError::TelescopeMismatch {
                expected,
                actual,
                num_timesteps,
                num_freqs,
            }),
        };
        let or_preset = |size: usize| match self.coarse_channel_size {
            0 => size,
            preset => preset,
        };

        let (coarse_channel_size, has_dc_spike) = if num_timesteps == GREEN_BANK_NUM_TIMESTEPS
            && num_freqs % GREEN_BANK_COARSE_CHANNEL_SIZE == 0
        {
            debug!("Data dimensions look like Green Bank data");
            check_telescope(Telescope::GreenBank)?;
            (or_preset(GREEN_BANK_COARSE_CHANNEL_SIZE), true)
        } else if num_freqs == ATA_NUM_FREQS {
            debug!("Data dimensions look like ATA data");
            check_telescope(Telescope::Ata)?;
            (or_preset(ATA_COARSE_CHANNEL_SIZE), false)
        } else if self.coarse_channel_size > 0 {
            // Only the DC spike needs to be inferred.
            (
                self.coarse_channel_size,
                self.telescope == Some(Telescope::GreenBank),
            )
        } else {
            return Err(MetadataError::CannotInfer {
                num_timesteps,
                num_freqs,
            });
        };

        if num_freqs % coarse_channel_size != 0 {
            return Err(MetadataError::NotDivisible {
                num_freqs,
                coarse_channel_size,
            });
        }

        self.coarse_channel_size = coarse_channel_size;
        self.has_dc_spike = has_dc_spike;
        self.num_coarse_channels = num_freqs / coarse_channel_size;
        trace!(
            "Inferred coarse channel size {}, {} coarse channels, DC spike: {}",
            self.coarse_channel_size,
            self.num_coarse_channels,
            self.has_dc_spike
        );
        Ok(())
    }

    /// Check that downstream processing can safely use this metadata.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.coarse_channel_size == 0 || self.num_coarse_channels == 0 {
            return Err(MetadataError::CoarseChannelSizeUnknown);
        }
        if self.num_freqs % self.coarse_channel_size != 0 {
            return Err(MetadataError::NotDivisible {
                num_freqs: self.num_freqs,
                coarse_channel_size: self.coarse_channel_size,
            });
        }
        if self.coarse_channel_size < MIN_COARSE_CHANNEL_SIZE {
            return Err(MetadataError::CoarseChannelTooSmall(
                self.coarse_channel_size,
            ));
        }
        if self.num_timesteps == 0 {
            return Err(MetadataError::NoTimesteps);
        }
        if self.beams.is_empty() {
            return Err(MetadataError::NoBeams);
        }
        Ok(())
    }

    /// Get the pointing information for a beam.
    pub fn beam(&self, beam: usize) -> Result<&BeamInfo, MetadataError> {
        self.beams.get(beam).ok_or(MetadataError::BeamOutOfRange {
            beam,
            num_beams: self.beams.len(),
        })
    }

    pub fn check_coarse_channel(&self, coarse_channel: usize) -> Result<(), MetadataError> {
        if coarse_channel < self.num_coarse_channels {
            Ok(())
        } else {
            Err(MetadataError::CoarseChannelOutOfRange {
                coarse_channel,
                num_coarse_channels: self.num_coarse_channels,
            })
        }
    }

    /// The length of the observation [seconds].
    pub fn obs_length(&self) -> f64 {
        self.num_timesteps as f64 * self.tsamp
    }

    /// The change in drift rate [Hz/s] corresponding to a one-channel
    /// change in drift over the whole observation. This assumes `foff` is
    /// in MHz.
    pub fn drift_rate_resolution(&self) -> f64 {
        1e6 * self.foff / self.obs_length()
    }

    /// The frequency of a fine channel within a coarse channel.
    pub fn fine_channel_freq(&self, coarse_channel: usize, fine_channel: usize) -> f64 {
        let global_channel = coarse_channel * self.coarse_channel_size + fine_channel;
        self.fch1 + global_channel as f64 * self.foff
    }
}
