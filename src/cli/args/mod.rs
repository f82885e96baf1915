// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    constants::{DEFAULT_HIT_FILE_EXTENSION, DEFAULT_MAX_DRIFT, DEFAULT_MIN_SNR},
    io::read::{open_filterbank, FilterbankRead, FILTERBANK_INPUT_EXTENSIONS},
    metadata::Telescope,
    params::SeticoreParams,
    search::BruteForceSearch,
    SeticoreError,
};

lazy_static::lazy_static! {
    static ref INPUT_HELP: String =
        format!("The filterbank file to search. Supported formats: {}", *FILTERBANK_INPUT_EXTENSIONS);

    static ref OUTPUT_HELP: String =
        format!("The path to the output hit file. Default: the input file with a .{DEFAULT_HIT_FILE_EXTENSION} extension");

    static ref MAX_DRIFT_HELP: String =
        format!("The largest drift rate to search for [Hz/s]. Default: {DEFAULT_MAX_DRIFT}");

    static ref MIN_SNR_HELP: String =
        format!("The smallest SNR a drift track must have to be reported as a hit. Default: {DEFAULT_MIN_SNR}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SeticoreArgs {
    #[clap(name = "INPUT_FILE", help = INPUT_HELP.as_str(), parse(from_os_str))]
    pub(super) input: Option<PathBuf>,

    #[clap(long, help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    #[serde(skip)]
    pub(super) args_file: Option<PathBuf>,

    #[clap(short = 'o', long, help = OUTPUT_HELP.as_str(), help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,

    /// The number of fine channels in each coarse channel. This is only
    /// needed if it can't be inferred from the data's dimensions.
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) coarse_channel_size: Option<usize>,

    /// The sigproc telescope ID of the data (e.g. 6 for Green Bank, 9 for the
    /// ATA). This overrides the file header.
    #[clap(long, help_heading = "INPUT DATA")]
    pub(super) telescope_id: Option<i32>,

    #[clap(long, help = MAX_DRIFT_HELP.as_str(), help_heading = "SEARCH")]
    pub(super) max_drift: Option<f64>,

    #[clap(long, help = MIN_SNR_HELP.as_str(), help_heading = "SEARCH")]
    pub(super) min_snr: Option<f32>,
}

impl SeticoreArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<SeticoreArgs, SeticoreError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let SeticoreArgs {
                input,
                args_file: _,
                output,
                coarse_channel_size,
                telescope_id,
                max_drift,
                min_snr,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(SeticoreArgs {
                input: cli_args.input.or(input),
                args_file: None,
                output: cli_args.output.or(output),
                coarse_channel_size: cli_args.coarse_channel_size.or(coarse_channel_size),
                telescope_id: cli_args.telescope_id.or(telescope_id),
                max_drift: cli_args.max_drift.or(max_drift),
                min_snr: cli_args.min_snr.or(min_snr),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<SeticoreParams, SeticoreError> {
        debug!("{:#?}", self);

        let Self {
            input,
            args_file: _,
            output,
            coarse_channel_size,
            telescope_id,
            max_drift,
            min_snr,
        } = self;

        let input = input.ok_or(SeticoreArgsError::NoInput)?;
        let max_drift = max_drift.unwrap_or(DEFAULT_MAX_DRIFT);
        if !(max_drift.is_finite() && max_drift >= 0.0) {
            return Err(SeticoreArgsError::BadMaxDrift(max_drift).into());
        }
        let min_snr = min_snr.unwrap_or(DEFAULT_MIN_SNR);
        if !min_snr.is_finite() {
            return Err(SeticoreArgsError::BadMinSnr(min_snr).into());
        }
        let output = output.unwrap_or_else(|| input.with_extension(DEFAULT_HIT_FILE_EXTENSION));
        if output == input {
            return Err(SeticoreArgsError::OutputIsInput(output).into());
        }

        let reader = open_filterbank(&input)?;
        let mut metadata = reader.get_metadata().clone();

        if let Some(id) = telescope_id {
            let telescope = Telescope::from_sigproc_id(id);
            match (metadata.telescope, telescope) {
                (Some(from_file), Some(from_user)) if from_file != from_user => format!(
                    "The file says the data came from {from_file}, but {from_user} was specified; using {from_user}"
                )
                .warn(),
                _ => (),
            }
            metadata.telescope = telescope;
        }
        match coarse_channel_size {
            Some(0) => return Err(SeticoreArgsError::ZeroCoarseChannelSize.into()),
            Some(n) => {
                if metadata.coarse_channel_size != 0 && metadata.coarse_channel_size != n {
                    format!(
                        "The file says coarse channels have {} fine channels, but {n} was specified; using {n}",
                        metadata.coarse_channel_size
                    )
                    .warn();
                }
                metadata.coarse_channel_size = n;
            }
            None => (),
        }
        metadata.infer_metadata()?;
        metadata.validate()?;

        if output.exists() {
            format!("Will overwrite the existing file '{}'", output.display()).warn();
        }

        let mut printer = InfoPrinter::new("Searching for hits".into());
        printer.push_block(vec![
            format!("Input:  {}", input.display()).into(),
            format!(
                "Telescope: {}",
                metadata
                    .telescope
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            )
            .into(),
            format!(
                "{} timesteps x {} fine channels ({} s x {} MHz)",
                metadata.num_timesteps, metadata.num_freqs, metadata.tsamp, metadata.foff
            )
            .into(),
            format!(
                "{} coarse channels of {} fine channels{}",
                metadata.num_coarse_channels,
                metadata.coarse_channel_size,
                if metadata.has_dc_spike {
                    ", with DC spikes"
                } else {
                    ""
                }
            )
            .into(),
            format!("{} beam(s)", metadata.beams.len()).into(),
        ]);
        printer.push_block(vec![
            format!("Max. drift rate: {max_drift} Hz/s").into(),
            format!("Min. SNR: {min_snr}").into(),
        ]);
        printer.push_line(format!("Output: {}", output.display()).into());
        printer.display();
        display_warnings();

        Ok(SeticoreParams {
            reader,
            metadata,
            searcher: Box::new(BruteForceSearch { max_drift, min_snr }),
            output,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), SeticoreError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum SeticoreArgsError {
    #[error("No input filterbank file was specified")]
    NoInput,

    #[error("The coarse channel size cannot be 0")]
    ZeroCoarseChannelSize,

    #[error("The maximum drift rate must be a non-negative number, but got {0}")]
    BadMaxDrift(f64),

    #[error("The minimum SNR must be a finite number, but got {0}")]
    BadMinSnr(f32),

    #[error("The output file '{}' is the same as the input file", .0.display())]
    OutputIsInput(PathBuf),
}
